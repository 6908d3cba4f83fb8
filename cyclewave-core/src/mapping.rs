//! Cycle → synthesis parameters.
//!
//! Two layers ride on top of each other: a step function picks one of five
//! scale degrees per 20% band of the cycle, and the continuous intensity
//! envelope moves the register and the modulation/brightness values.

use crate::cycle::CycleDescriptor;
use crate::dsp::{m_exp2, m_floor};

/// Anchor frequency (G below A440).
pub const BASE_FREQUENCY_HZ: f64 = 392.0;

/// Five-note ratio palette, one degree per fifth of the cycle.
pub const NOTE_PALETTE: [f64; 5] = [1.0, 9.0 / 8.0, 5.0 / 4.0, 3.0 / 2.0, 5.0 / 3.0];

/// Number of tone voices in the additive stack.
pub const VOICE_COUNT: usize = 4;

/// Multipliers of the root for each voice: unison, fifth, octave, sub.
pub const VOICE_MULTIPLIERS: [f64; VOICE_COUNT] = [1.0, 1.5, 2.0, 0.5];

/// Everything the engine needs for one moment of the cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SynthesisParameters {
    pub root_frequency_hz: f64,
    /// `root * VOICE_MULTIPLIERS`, in voice order.
    pub harmonic_frequencies_hz: [f64; VOICE_COUNT],
    /// LFO rate, `[0.05, 0.30]` Hz.
    pub modulation_rate_hz: f64,
    /// Advisory, `[250, 2650]` Hz. No filter stage consumes it yet.
    pub filter_cutoff_hz: f64,
    /// Advisory, `[0.25, 0.60]`. No reverb stage consumes it yet.
    pub reverb_mix: f64,
}

/// Index into [`NOTE_PALETTE`] for a cycle position.
#[inline]
pub fn palette_index(cycle: &CycleDescriptor) -> usize {
    let bands = NOTE_PALETTE.len();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let idx = m_floor(cycle.phase_fraction * bands as f64) as usize;
    idx % bands
}

/// Register shift, `2^(intensity*1.2 - 1)`: half the base at rest, ~2.3x at peak.
#[inline]
pub fn octave_multiplier(intensity: f64) -> f64 {
    m_exp2(intensity * 1.2 - 1.0)
}

/// Pure mapping from a cycle descriptor to synthesis parameters.
pub fn map_to_parameters(cycle: &CycleDescriptor) -> SynthesisParameters {
    let note = NOTE_PALETTE[palette_index(cycle)];
    let intensity = cycle.intensity;
    let root = BASE_FREQUENCY_HZ * note * octave_multiplier(intensity);

    let mut harmonics = [0.0; VOICE_COUNT];
    for (h, m) in harmonics.iter_mut().zip(VOICE_MULTIPLIERS) {
        *h = root * m;
    }

    SynthesisParameters {
        root_frequency_hz: root,
        harmonic_frequencies_hz: harmonics,
        modulation_rate_hz: 0.05 + intensity * 0.25,
        filter_cutoff_hz: 250.0 + intensity * 2400.0,
        reverb_mix: 0.25 + (1.0 - intensity) * 0.35,
    }
}
