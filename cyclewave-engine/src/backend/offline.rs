//! Device-less backend.
//!
//! Keeps the renderer in shared state so the host (or a test) pulls audio
//! whenever it wants. Cloning the backend shares that state, which is how
//! callers observe contexts after handing the backend to the engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{AudioBackend, AudioContext};
use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphRenderer, ToneGraph};

#[derive(Copy, Clone, Debug)]
pub struct OfflineOptions {
    pub sample_rate: f32,
    /// New contexts start suspended and need a `resume`.
    pub start_suspended: bool,
    /// Refuse to open, as a host without audio would.
    pub refuse_open: bool,
    /// Report an error from `close` (the context is still released).
    pub fail_close: bool,
    /// Refuse to leave the suspended state, as a host that denies autoplay would.
    pub fail_resume: bool,
}

impl Default for OfflineOptions {
    fn default() -> Self {
        Self { sample_rate: 48_000.0, start_suspended: true, refuse_open: false, fail_close: false, fail_resume: false }
    }
}

#[derive(Debug, Default)]
struct Shared {
    renderer: Option<GraphRenderer>,
    live_id: Option<u64>,
    suspended: bool,
    opened: usize,
    closed: usize,
}

impl Shared {
    fn release(&mut self, id: u64) -> bool {
        if self.live_id == Some(id) {
            self.live_id = None;
            self.renderer = None;
            self.closed += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OfflineBackend {
    options: OfflineOptions,
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // the state stays consistent across a panicking holder; keep going
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OfflineBackend {
    pub fn new(options: OfflineOptions) -> Self {
        Self { options, shared: Arc::default() }
    }

    /// A backend that always fails to open.
    pub fn unsupported() -> Self {
        Self::new(OfflineOptions { refuse_open: true, ..OfflineOptions::default() })
    }

    pub fn options(&self) -> OfflineOptions {
        self.options
    }

    /// Contexts ever opened.
    pub fn contexts_opened(&self) -> usize {
        lock(&self.shared).opened
    }

    /// Contexts closed or dropped.
    pub fn contexts_closed(&self) -> usize {
        lock(&self.shared).closed
    }

    /// Contexts currently holding a renderer (0 or 1).
    pub fn live_contexts(&self) -> usize {
        usize::from(lock(&self.shared).live_id.is_some())
    }

    /// Copy of the live graph, for inspection.
    pub fn graph(&self) -> Option<ToneGraph> {
        lock(&self.shared).renderer.as_ref().map(|r| *r.graph())
    }

    /// Render `frames` mono samples. Silence when no context is live or the
    /// live one is suspended.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        let mut shared = lock(&self.shared);
        if shared.suspended {
            return out;
        }
        if let Some(r) = shared.renderer.as_mut() {
            r.render(&mut out);
        }
        out
    }
}

impl AudioBackend for OfflineBackend {
    type Context = OfflineContext;

    fn open(&mut self, mut renderer: GraphRenderer) -> EngineResult<OfflineContext> {
        if self.options.refuse_open {
            return Err(EngineError::UnsupportedPlatform("offline backend configured without audio".into()));
        }
        renderer.set_sample_rate(self.options.sample_rate);

        let mut shared = lock(&self.shared);
        if let Some(stale) = shared.live_id {
            // one context at a time; the old one is orphaned, count it closed
            debug!(stale, "offline: replacing live context");
            shared.release(stale);
        }
        shared.opened += 1;
        let id = shared.opened as u64;
        shared.live_id = Some(id);
        shared.renderer = Some(renderer);
        shared.suspended = self.options.start_suspended;
        debug!(id, sr = self.options.sample_rate, "offline: context opened");

        Ok(OfflineContext {
            id,
            sample_rate: self.options.sample_rate,
            suspended: self.options.start_suspended,
            closed: false,
            fail_close: self.options.fail_close,
            fail_resume: self.options.fail_resume,
            shared: Arc::clone(&self.shared),
        })
    }
}

#[derive(Debug)]
pub struct OfflineContext {
    id: u64,
    sample_rate: f32,
    suspended: bool,
    closed: bool,
    fail_close: bool,
    fail_resume: bool,
    shared: Arc<Mutex<Shared>>,
}

impl OfflineContext {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl AudioContext for OfflineContext {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> EngineResult<()> {
        if self.closed {
            return Err(EngineError::UnsupportedPlatform("context already closed".into()));
        }
        if self.fail_resume {
            return Err(EngineError::UnsupportedPlatform(format!("offline context {} denied resume", self.id)));
        }
        self.suspended = false;
        let mut shared = lock(&self.shared);
        if shared.live_id == Some(self.id) {
            shared.suspended = false;
        }
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        lock(&self.shared).release(self.id);
        debug!(id = self.id, "offline: context closed");
        if self.fail_close {
            return Err(EngineError::ResourceRelease(format!("offline context {} refused to close cleanly", self.id)));
        }
        Ok(())
    }
}

impl Drop for OfflineContext {
    fn drop(&mut self) {
        if !self.closed {
            lock(&self.shared).release(self.id);
        }
    }
}
