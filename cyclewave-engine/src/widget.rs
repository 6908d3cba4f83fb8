//! The mounted widget: state machine, periodic tasks, and teardown.
//!
//! `Stopped --start--> Playing --stop--> Stopped`. Both periodic tasks run for
//! the whole mounted lifetime, whatever the playback state. They are scheduled
//! once in [`WidgetController::mount`] and cancelled once on unmount or drop.

use cyclewave_core::cycle::{compute_cycle, CycleDescriptor};
use cyclewave_core::mapping::{map_to_parameters, SynthesisParameters};
use tracing::{debug, trace, warn};

use crate::analysis::{AnalysisFrame, FLAT_FRAME};
use crate::backend::AudioBackend;
use crate::clock::Clock;
use crate::config::WidgetConfig;
use crate::error::{EngineError, EngineResult};
use crate::render::{Surface, VisualizationRenderer};
use crate::schedule::{Scheduler, TaskId, TaskKind};
use crate::synth::SynthesisEngine;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Playing,
}

/// What a host needs to draw the widget.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetState {
    pub playback: Playback,
    pub muted: bool,
    pub volume: f32,
    pub compact: bool,
    /// Refreshed on every tick, playing or not.
    pub current_cycle: CycleDescriptor,
    pub current_params: SynthesisParameters,
    /// Flat while stopped.
    pub last_waveform: AnalysisFrame,
    /// Unix seconds of the last refresh.
    pub updated_at: f64,
    /// Why the last `start` failed; cleared by the next successful one.
    pub last_error: Option<EngineError>,
}

#[derive(Copy, Clone, Debug)]
struct MountedTasks {
    refresh: TaskId,
    frame: TaskId,
}

pub struct WidgetController<B: AudioBackend, S: Scheduler, C: Clock> {
    engine: SynthesisEngine<B>,
    scheduler: S,
    clock: C,
    renderer: VisualizationRenderer,
    state: WidgetState,
    tasks: Option<MountedTasks>,
}

impl<B: AudioBackend, S: Scheduler, C: Clock> WidgetController<B, S, C> {
    /// Compute the current cycle, build a stopped engine and schedule both tasks.
    pub fn mount(config: WidgetConfig, backend: B, mut scheduler: S, clock: C) -> Self {
        let config = config.validated();
        let now = clock.unix_seconds();
        let cycle = compute_cycle(now);
        let params = map_to_parameters(&cycle);

        let mut engine = SynthesisEngine::new(backend, params);
        engine.set_volume(config.volume);
        engine.set_muted(config.muted);

        let tasks = MountedTasks {
            refresh: scheduler.schedule_repeating(TaskKind::ParameterRefresh, config.refresh_interval()),
            frame: scheduler.schedule_repeating(TaskKind::AnimationFrame, config.frame_interval()),
        };
        debug!(phase = %cycle.phase_name, compact = config.compact, "widget mounted");

        Self {
            state: WidgetState {
                playback: Playback::Stopped,
                muted: engine.is_muted(),
                volume: engine.volume(),
                compact: config.compact,
                current_cycle: cycle,
                current_params: params,
                last_waveform: FLAT_FRAME,
                updated_at: now,
                last_error: None,
            },
            engine,
            scheduler,
            clock,
            renderer: VisualizationRenderer,
            tasks: Some(tasks),
        }
    }

    /// Run the task the host's scheduler reported as due.
    pub fn dispatch<Sf: Surface + ?Sized>(&mut self, kind: TaskKind, surface: &mut Sf) {
        match kind {
            TaskKind::ParameterRefresh => self.refresh(),
            TaskKind::AnimationFrame => self.animation_frame(surface),
        }
    }

    pub fn refresh(&mut self) {
        let now = self.clock.unix_seconds();
        let cycle = compute_cycle(now);
        let params = map_to_parameters(&cycle);
        self.state.current_cycle = cycle;
        self.state.current_params = params;
        self.state.updated_at = now;
        if self.state.playback == Playback::Playing {
            self.engine.retune(&params);
        }
        trace!(phase = %cycle.phase_name, intensity = cycle.intensity, "parameters refreshed");
    }

    pub fn animation_frame<Sf: Surface + ?Sized>(&mut self, surface: &mut Sf) {
        self.state.last_waveform = self.engine.analysis_frame();
        self.renderer.render(&self.state.last_waveform, surface);
    }

    /// Start playback. A failure is kept in [`WidgetState::last_error`] and
    /// the widget stays stopped until the user tries again.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.state.playback == Playback::Playing {
            trace!("start requested while playing");
            return Ok(());
        }
        self.engine.retune(&self.state.current_params);
        match self.engine.start() {
            Ok(()) => {
                self.state.playback = Playback::Playing;
                self.state.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("playback unavailable: {e}");
                self.state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Stop playback. Always ends stopped; a release failure is only logged.
    pub fn stop(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!("audio teardown incomplete: {e}");
        }
        self.state.playback = Playback::Stopped;
        self.state.last_waveform = FLAT_FRAME;
    }

    pub fn toggle_play(&mut self) -> EngineResult<()> {
        match self.state.playback {
            Playback::Stopped => self.start(),
            Playback::Playing => {
                self.stop();
                Ok(())
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
        self.state.volume = self.engine.volume();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.engine.set_muted(muted);
        self.state.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.state.muted);
    }

    /// Cancel both tasks and stop the engine.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(tasks) = self.tasks.take() else {
            return;
        };
        self.scheduler.cancel(tasks.refresh);
        self.scheduler.cancel(tasks.frame);
        self.stop();
        debug!("widget unmounted");
    }

    #[inline] pub fn state(&self) -> &WidgetState { &self.state }
    #[inline] pub fn engine(&self) -> &SynthesisEngine<B> { &self.engine }
    #[inline] pub fn is_mounted(&self) -> bool { self.tasks.is_some() }
}

impl<B: AudioBackend, S: Scheduler, C: Clock> Drop for WidgetController<B, S, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
