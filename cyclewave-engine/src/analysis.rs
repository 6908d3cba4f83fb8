//! Analysis tap: the audio thread writes, the UI thread snapshots.
//!
//! A fixed window of the most recent output samples, stored as unsigned bytes
//! (`128` is silence) in a ring of `AtomicU8`. Writes and reads are relaxed and
//! may tear across a frame; that only affects one drawn frame of the scope.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Samples kept by the tap.
pub const WINDOW_LEN: usize = 128;

/// Bytes handed to the visualizer per frame.
pub const FRAME_LEN: usize = WINDOW_LEN / 2;

/// Byte value of a zero sample.
pub const NEUTRAL: u8 = 128;

/// One visualizer frame.
pub type AnalysisFrame = [u8; FRAME_LEN];

/// A flat frame, drawn while nothing is playing.
pub const FLAT_FRAME: AnalysisFrame = [NEUTRAL; FRAME_LEN];

/// Convert a sample in `[-1, 1]` to its byte form, clamped to `0..=255`.
#[inline]
pub fn sample_to_byte(x: f32) -> u8 {
    let v = 128.0 * (1.0 + x);
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        // in (0, 255): truncation is the intended quantization
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let b = v as u8;
        b
    }
}

#[derive(Debug)]
pub struct AnalysisTap {
    samples: Box<[AtomicU8]>,
    write: AtomicUsize,
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisTap {
    pub fn new() -> Self {
        let samples = (0..WINDOW_LEN).map(|_| AtomicU8::new(NEUTRAL)).collect();
        Self { samples, write: AtomicUsize::new(0) }
    }

    /// Push one output sample (audio thread).
    #[inline]
    pub fn push(&self, x: f32) {
        let i = self.write.load(Ordering::Relaxed);
        self.samples[i].store(sample_to_byte(x), Ordering::Relaxed);
        self.write.store((i + 1) % WINDOW_LEN, Ordering::Relaxed);
    }

    /// The most recent [`FRAME_LEN`] samples, oldest first.
    pub fn snapshot(&self) -> AnalysisFrame {
        let end = self.write.load(Ordering::Relaxed);
        let start = (end + WINDOW_LEN - FRAME_LEN) % WINDOW_LEN;
        let mut out = FLAT_FRAME;
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.samples[(start + k) % WINDOW_LEN].load(Ordering::Relaxed);
        }
        out
    }
}
