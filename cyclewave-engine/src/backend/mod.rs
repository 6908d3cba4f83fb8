//! Platform audio boundary.
//!
//! The engine never reaches for a global audio device. It is handed an
//! [`AudioBackend`] at construction and asks it for a fresh [`AudioContext`]
//! each time playback starts. The backend takes ownership of the
//! [`GraphRenderer`] and drives it from whatever thread it likes; the engine
//! only talks to the graph through its command ring.
//!
//! - [`OfflineBackend`]: no device, renders on demand (tests, headless hosts)
//! - `CpalBackend`: realtime output through CPAL (feature `realtime`)

use crate::error::EngineResult;
use crate::graph::GraphRenderer;

mod offline;

#[cfg(feature = "realtime")]
mod cpal_backend;

pub use offline::{OfflineBackend, OfflineContext, OfflineOptions};

#[cfg(feature = "realtime")]
pub use cpal_backend::{output_device_names, CpalBackend, CpalContext};

/// A live processing context. Dropping it must release the underlying
/// resource even if [`close`](AudioContext::close) was never called.
pub trait AudioContext {
    /// Rate the renderer is being driven at.
    fn sample_rate(&self) -> f32;

    /// True until the first successful [`resume`](AudioContext::resume).
    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> EngineResult<()>;

    /// Stop processing and release the resource. Called at most once by the engine.
    fn close(&mut self) -> EngineResult<()>;
}

/// Factory for processing contexts.
pub trait AudioBackend {
    type Context: AudioContext;

    /// Open a new context that renders `renderer`.
    ///
    /// Fails with [`EngineError::UnsupportedPlatform`](crate::EngineError::UnsupportedPlatform)
    /// when no audio capability is available.
    fn open(&mut self, renderer: GraphRenderer) -> EngineResult<Self::Context>;
}
