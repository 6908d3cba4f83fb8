//! Engine error types

use thiserror::Error;

/// Errors surfaced by the synthesis engine and its platform backends.
///
/// Redundant oscillator start/stop is not an error; see
/// [`Transition`](crate::synth::Transition).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The realtime audio capability is missing or was refused by the host
    #[error("playback unavailable: {0}")]
    UnsupportedPlatform(String),

    /// Tearing down the processing context failed
    #[error("failed to release audio context: {0}")]
    ResourceRelease(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
