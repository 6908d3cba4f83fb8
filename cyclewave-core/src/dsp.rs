//! Math backend and small DSP helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - One place that decides where `sin`/`cos`/`exp`/`floor` come from
//! - Optional `fast-math` sine for the oscillator hot path
//!
//! Conventions:
//! - Cycle/parameter math runs in `f64` (wall-clock seconds need the range).
//! - Per-sample audio math runs in `f32`.

#![allow(clippy::excessive_precision)]

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sinf(x: f32) -> f32 { libm::sinf(x) }
        #[inline] pub(crate) fn m_expf(x: f32) -> f32 { libm::expf(x) }
        #[inline] pub(crate) fn m_cos(x: f64) -> f64 { libm::cos(x) }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { libm::floor(x) }
        #[inline] pub(crate) fn m_exp2(x: f64) -> f64 { libm::exp2(x) }
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { libm::exp(x) }
    } else {
        #[inline] pub(crate) fn m_sinf(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_expf(x: f32) -> f32 { x.exp() }
        #[inline] pub(crate) fn m_cos(x: f64) -> f64 { x.cos() }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { x.floor() }
        #[inline] pub(crate) fn m_exp2(x: f64) -> f64 { x.exp2() }
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { x.exp() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π in `f32`, for oscillator phase.
pub const TAU: f32 = core::f32::consts::TAU;

/// 2π in `f64`, for cycle math.
pub const TAU_F64: f64 = core::f64::consts::TAU;

/// Values below this magnitude are flushed to zero.
pub const EPS_SMALL: f32 = 1.0e-20;

// --------------------------------- Utilities -------------------------------------

/// Wrap phase into [0, 1).
#[inline]
pub fn wrap_phase01(p: f32) -> f32 {
    let w = p - (p as i64) as f32;
    if w < 0.0 { w + 1.0 } else if w >= 1.0 { w - 1.0 } else { w }
}

/// Kill denormal/subnormal values. Returns 0.0 if |x| < EPS_SMALL.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if x.abs() < EPS_SMALL { 0.0 } else { x }
}

/// One-pole coefficient for a time constant given in **seconds**.
///
/// With `a = exp(-1/(tau*sr))`, the form `y += (x - y) * (1 - a)` reaches
/// ~63% of a step after `tau` seconds. `tau <= 0` means "jump" (`a = 0`).
#[inline]
pub fn one_pole_coeff_s(tau_s: f32, sr: f32) -> f32 {
    if tau_s <= 0.0 || sr <= 0.0 {
        return 0.0;
    }
    m_expf(-1.0 / (tau_s * sr))
}

/// `f64` twin of [`one_pole_coeff_s`] for slow followers, where `1 - a` is
/// too small for `f32` to carry the last part of the approach.
#[inline]
pub fn one_pole_coeff_s_f64(tau_s: f64, sr: f64) -> f64 {
    if tau_s <= 0.0 || sr <= 0.0 {
        return 0.0;
    }
    m_exp(-1.0 / (tau_s * sr))
}

// --------------------------------- Sine ------------------------------------------

/// Sine of `2π * phase01`.
///
/// With `fast-math`, a 5th-order odd polynomial after range reduction
/// (max abs error ~5e-3, fine for drones). Exact otherwise.
#[inline]
pub fn sin01(phase01: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            // fold [0,1) onto [-1/4, 1/4] so the polynomial stays within ±π/2
            let mut p = if phase01 >= 0.5 { phase01 - 1.0 } else { phase01 };
            if p > 0.25 {
                p = 0.5 - p;
            } else if p < -0.25 {
                p = -0.5 - p;
            }
            let x = TAU * p;
            let x2 = x * x;
            x * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            m_sinf(TAU * phase01)
        }
    }
}

// --------------------------------- Tests (std only) ------------------------------
