//! Oscillator building blocks for the tone graph.
//!
//! These are zero-allocation, per-sample components designed for realtime use.
//! Everything here is `Copy`; no locks, no heap.
//!
//! Contents:
//! - `Wave`, `Osc` : sine / triangle oscillator with stable phase wrap
//! - `Lfo`         : sub-audio sine oscillator used for shared vibrato
//!
//! Frequency is **Hz**; `next` takes the current **sample rate**.

use cyclewave_core::dsp::{sin01, wrap_phase01};

/// Oscillator waveform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wave { Sine, Triangle }

/// Triangle aligned with sine: 0 at phase 0, +1 at 1/4, -1 at 3/4.
#[inline]
fn triangle(phase01: f32) -> f32 {
    if phase01 < 0.25 {
        4.0 * phase01
    } else if phase01 < 0.75 {
        2.0 - 4.0 * phase01
    } else {
        4.0 * phase01 - 4.0
    }
}

#[inline]
fn osc_sample(phase01: f32, wave: Wave) -> f32 {
    match wave {
        Wave::Sine => sin01(phase01),
        Wave::Triangle => triangle(phase01),
    }
}

/// Free-running oscillator. Not anti-aliased; the tone stack stays well below
/// Nyquist so this is fine for drones.
#[derive(Copy, Clone, Debug)]
pub struct Osc {
    phase: f32, // [0,1)
    freq: f32,  // Hz
    wave: Wave,
}

impl Osc {
    #[inline] pub fn new(freq_hz: f32, wave: Wave) -> Self { Self { phase: 0.0, freq: freq_hz.max(0.0), wave } }
    #[inline] pub fn set_freq(&mut self, hz: f32) { self.freq = hz.max(0.0); }
    #[inline] pub fn freq(&self) -> f32 { self.freq }
    #[inline] pub fn wave(&self) -> Wave { self.wave }

    /// Output the current sample, then advance one sample.
    #[inline]
    pub fn next(&mut self, sr: f32) -> f32 {
        let s = osc_sample(self.phase, self.wave);
        self.phase = wrap_phase01(self.phase + self.freq / sr);
        s
    }
}

/// Low-frequency sine in **[-1,1]**.
#[derive(Copy, Clone, Debug)]
pub struct Lfo(Osc);

impl Lfo {
    #[inline] pub fn sine(rate_hz: f32) -> Self { Self(Osc::new(rate_hz, Wave::Sine)) }
    #[inline] pub fn set_rate(&mut self, hz: f32) { self.0.set_freq(hz); }
    #[inline] pub fn rate(&self) -> f32 { self.0.freq() }
    #[inline] pub fn next(&mut self, sr: f32) -> f32 { self.0.next(sr) }
}
