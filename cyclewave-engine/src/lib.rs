//! Cyclewave engine: tone graph, platform capabilities, scope and widget.
//!
//! Crate layout:
//! - [`graph`]    : `Generator` trait, `ToneGraph` and its command-driven renderer
//! - [`nodes`]    : oscillators and the shared vibrato LFO
//! - [`analysis`] : lock-free time-domain tap feeding the scope
//! - [`synth`]    : `SynthesisEngine`, owner of one play session's graph
//! - [`backend`]  : audio capability (`cpal` realtime, offline)
//! - [`schedule`], [`clock`] : timer and wall-clock capabilities
//! - [`render`]   : waveform scope over a host `Surface`
//! - [`widget`]   : `WidgetController`, the mounted state machine
//!
//! Nothing on the audio thread locks or allocates. Parameters travel over an
//! `rtrb` ring and the scope reads atomics.

pub mod analysis;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod render;
pub mod schedule;
pub mod synth;
pub mod widget;

pub use cyclewave_core;

pub use analysis::{AnalysisFrame, FLAT_FRAME};
pub use backend::{AudioBackend, AudioContext, OfflineBackend, OfflineOptions};
#[cfg(feature = "realtime")]
pub use backend::CpalBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WidgetConfig;
pub use error::{EngineError, EngineResult};
pub use graph::Generator;
pub use render::{Surface, VisualizationRenderer};
pub use schedule::{IntervalScheduler, Scheduler, TaskKind};
pub use synth::{SynthesisEngine, DEFAULT_VOLUME};
pub use widget::{Playback, WidgetController, WidgetState};
