//! Exponential target follower for parameter glides.
//!
//! `Glide` approaches its target with a first-order lag: after one time
//! constant it has covered ~63% of the distance. Setting a new target mid-glide
//! simply bends the curve toward it; nothing is awaited or cancelled.

use crate::dsp::one_pole_coeff_s_f64;

/// Remaining distance at which the glide lands exactly on its target.
const SETTLE_EPS: f64 = 1.0e-6;

/// Runs in `f64` internally: at audio rates `1 - a` is ~4e-5, which `f32`
/// cannot apply to a value in the hundreds of hertz, so an `f32` follower
/// stalls short of the target.
#[derive(Copy, Clone, Debug)]
pub struct Glide {
    tau_s: f64,
    alpha: f64,
    target: f64,
    y: f64,
}

impl Glide {
    #[inline]
    pub fn new(tau_s: f32, sr: f32) -> Self {
        let tau_s = f64::from(tau_s);
        Self { tau_s, alpha: one_pole_coeff_s_f64(tau_s, f64::from(sr)), target: 0.0, y: 0.0 }
    }

    /// Recompute the coefficient after a sample-rate change.
    #[inline]
    pub fn set_sample_rate(&mut self, sr: f32) {
        self.alpha = one_pole_coeff_s_f64(self.tau_s, f64::from(sr));
    }

    /// Move toward `target` from the current value.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = f64::from(target);
    }

    /// Jump straight to `value` (no glide).
    #[inline]
    pub fn jump_to(&mut self, value: f32) {
        self.target = f64::from(value);
        self.y = self.target;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let gap = self.target - self.y;
        if gap.abs() < SETTLE_EPS {
            self.y = self.target;
        } else {
            self.y += gap * (1.0 - self.alpha);
        }
        self.value()
    }

    #[allow(clippy::cast_possible_truncation)]
    #[inline] pub fn value(&self) -> f32 { self.y as f32 }
    #[allow(clippy::cast_possible_truncation)]
    #[inline] pub fn target(&self) -> f32 { self.target as f32 }
}
