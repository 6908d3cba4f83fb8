//! Cycle clock: wall-clock time → position inside a fixed repeating cycle.
//!
//! The cycle is anchored to the Unix epoch rather than to session start, so two
//! observers at the same second see the same cycle and a long session never
//! drifts. Everything here is pure and total.

use core::fmt;

use crate::dsp::{m_cos, m_floor, TAU_F64};

/// Length of one cycle in seconds (a five minute loop).
pub const CYCLE_SECONDS: u32 = 300;

/// Quadrant label of the cycle. Boundaries at 0.25 / 0.5 / 0.75, closed-open.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PhaseName {
    Ignition,
    Lift,
    Drift,
    Return,
}

impl PhaseName {
    /// Quadrant for a phase fraction in `[0, 1)`.
    #[inline]
    pub fn from_fraction(phase_fraction: f64) -> Self {
        if phase_fraction < 0.25 {
            Self::Ignition
        } else if phase_fraction < 0.5 {
            Self::Lift
        } else if phase_fraction < 0.75 {
            Self::Drift
        } else {
            Self::Return
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignition => "Ignition",
            Self::Lift => "Lift",
            Self::Drift => "Drift",
            Self::Return => "Return",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where "now" sits in the cycle. Recomputed on every tick, never mutated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CycleDescriptor {
    /// Position within the cycle, `[0, 1)`.
    pub phase_fraction: f64,
    /// Raised-cosine envelope, 0 at phase 0 and 1 at phase 0.5.
    pub intensity: f64,
    pub phase_name: PhaseName,
    /// Whole seconds into the cycle, `[0, CYCLE_SECONDS)`.
    pub seconds_into_cycle: u32,
}

impl CycleDescriptor {
    /// Descriptor for a whole-second offset into the cycle (wrapped).
    pub fn at_second(seconds_into_cycle: u32) -> Self {
        let seconds_into_cycle = seconds_into_cycle % CYCLE_SECONDS;
        let phase_fraction = f64::from(seconds_into_cycle) / f64::from(CYCLE_SECONDS);
        let intensity = 0.5 - 0.5 * m_cos(TAU_F64 * phase_fraction);
        Self {
            phase_fraction,
            intensity,
            phase_name: PhaseName::from_fraction(phase_fraction),
            seconds_into_cycle,
        }
    }

    /// Intensity as a whole percentage, the way the widget displays it.
    #[inline]
    pub fn intensity_percent(&self) -> u8 {
        // intensity is within [0, 1], so the rounded value fits in 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.intensity * 100.0 + 0.5) as u8;
        pct.min(100)
    }
}

/// Map a Unix timestamp (seconds, fractional allowed) to its cycle descriptor.
///
/// Only the floor-second matters. Pre-epoch timestamps wrap with Euclidean
/// remainder; non-finite input is treated as second 0.
pub fn compute_cycle(unix_seconds: f64) -> CycleDescriptor {
    let whole = if unix_seconds.is_finite() {
        // saturating float→int cast; the remainder below keeps the range
        #[allow(clippy::cast_possible_truncation)]
        let floor_s = m_floor(unix_seconds) as i64;
        floor_s
    } else {
        0
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let wrapped = whole.rem_euclid(i64::from(CYCLE_SECONDS)) as u32;
    CycleDescriptor::at_second(wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn start_of_cycle_is_ignition_with_zero_intensity() {
        let c = compute_cycle(0.0);
        assert_eq!(c.phase_name, PhaseName::Ignition);
        assert_eq!(c.seconds_into_cycle, 0);
        assert!(c.intensity.abs() < EPS);
    }

    #[test]
    fn midpoint_is_drift_with_full_intensity() {
        let c = compute_cycle(150.0);
        assert_eq!(c.phase_name, PhaseName::Drift);
        assert!((c.phase_fraction - 0.5).abs() < EPS);
        assert!((c.intensity - 1.0).abs() < EPS);
        assert_eq!(c.intensity_percent(), 100);
    }

    #[test]
    fn same_floor_second_modulo_cycle_is_bit_identical() {
        let a = compute_cycle(1_700_000_123.1);
        let b = compute_cycle(1_700_000_123.9);
        let c = compute_cycle(1_700_000_123.0 + 300.0 * 17.0);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.intensity.to_bits(), c.intensity.to_bits());
    }

    #[test]
    fn intensity_is_symmetric_about_the_midpoint() {
        for s in 1..150_u32 {
            let rise = CycleDescriptor::at_second(s);
            let fall = CycleDescriptor::at_second(CYCLE_SECONDS - s);
            assert!((rise.intensity - fall.intensity).abs() < 1e-9, "s={s}");
        }
    }

    #[test]
    fn quadrant_boundaries_are_closed_open() {
        assert_eq!(PhaseName::from_fraction(0.25), PhaseName::Lift);
        assert_eq!(PhaseName::from_fraction(0.25 - f64::EPSILON), PhaseName::Ignition);
        assert_eq!(PhaseName::from_fraction(0.5), PhaseName::Drift);
        assert_eq!(PhaseName::from_fraction(0.75), PhaseName::Return);
        assert_eq!(compute_cycle(74.0).phase_name, PhaseName::Ignition);
        assert_eq!(compute_cycle(75.0).phase_name, PhaseName::Lift);
        assert_eq!(compute_cycle(299.0).phase_name, PhaseName::Return);
    }

    #[test]
    fn pre_epoch_and_non_finite_inputs_stay_in_range() {
        let c = compute_cycle(-1.0);
        assert_eq!(c.seconds_into_cycle, 299);
        let c = compute_cycle(-0.5);
        assert_eq!(c.seconds_into_cycle, 299);
        assert_eq!(compute_cycle(f64::NAN), compute_cycle(0.0));
        assert_eq!(compute_cycle(f64::INFINITY), compute_cycle(0.0));
    }

    #[test]
    fn phase_names_display() {
        assert_eq!(PhaseName::Ignition.to_string(), "Ignition");
        assert_eq!(PhaseName::Return.to_string(), "Return");
    }
}
