//! Synthesis engine: owns the audio graph for the length of one play session.
//!
//! The graph is an [`AudioGraphHandle`] built atomically on `start` and dropped
//! atomically on `stop`; there is no half-built state in between. Oscillators
//! carry an explicit started/stopped flag, so repeated start/stop requests are
//! answered from that flag instead of poking the audio thread again.

use std::sync::Arc;

use cyclewave_core::mapping::SynthesisParameters;
use tracing::{debug, trace, warn};

use crate::analysis::{AnalysisFrame, AnalysisTap, FLAT_FRAME};
use crate::backend::{AudioBackend, AudioContext};
use crate::error::EngineResult;
use crate::graph::{command_channel, GraphCommand, GraphRenderer, ToneGraph, OSCILLATOR_COUNT};

/// Volume a fresh engine starts at.
pub const DEFAULT_VOLUME: f32 = 0.45;

/// Rate the graph is built at before the backend reports the device rate.
const PROVISIONAL_SAMPLE_RATE: f32 = 48_000.0;

/// Outcome of a start/stop request on one oscillator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The primitive was sent.
    Applied,
    /// Already in the requested state; nothing was sent.
    Redundant,
    /// The command ring was full; the oscillator is unchanged.
    Dropped,
}

#[derive(Copy, Clone, Debug, Default)]
struct OscillatorHandle {
    started: bool,
    stopped: bool,
}

/// Everything one play session owns: the context, the command producer, the
/// analysis tap and per-oscillator flags.
pub struct AudioGraphHandle<C: AudioContext> {
    context: C,
    commands: rtrb::Producer<GraphCommand>,
    tap: Arc<AnalysisTap>,
    oscillators: Vec<OscillatorHandle>,
}

impl<C: AudioContext> AudioGraphHandle<C> {
    fn send(&mut self, cmd: GraphCommand) -> bool {
        match self.commands.push(cmd) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(cmd)) => {
                warn!(?cmd, "graph command queue full; dropping");
                false
            }
        }
    }

    fn start_oscillator(&mut self, slot: usize) -> Transition {
        if self.oscillators[slot].started {
            return Transition::Redundant;
        }
        if !self.send(GraphCommand::StartOscillator(slot)) {
            return Transition::Dropped;
        }
        self.oscillators[slot].started = true;
        Transition::Applied
    }

    fn stop_oscillator(&mut self, slot: usize) -> Transition {
        let osc = self.oscillators[slot];
        if !osc.started || osc.stopped {
            return Transition::Redundant;
        }
        if !self.send(GraphCommand::StopOscillator(slot)) {
            return Transition::Dropped;
        }
        self.oscillators[slot].stopped = true;
        Transition::Applied
    }

    fn running_oscillators(&self) -> usize {
        self.oscillators.iter().filter(|o| o.started && !o.stopped).count()
    }
}

pub struct SynthesisEngine<B: AudioBackend> {
    backend: B,
    params: SynthesisParameters,
    volume: f32,
    muted: bool,
    graph: Option<AudioGraphHandle<B::Context>>,
}

impl<B: AudioBackend> SynthesisEngine<B> {
    pub fn new(backend: B, params: SynthesisParameters) -> Self {
        Self { backend, params, volume: DEFAULT_VOLUME, muted: false, graph: None }
    }

    /// Build the graph if needed, resume the context, start every oscillator once.
    ///
    /// Calling this while already playing is harmless: every oscillator
    /// reports [`Transition::Redundant`] and nothing reaches the audio thread.
    pub fn start(&mut self) -> EngineResult<()> {
        let handle = match self.graph.take() {
            Some(h) => h,
            None => self.build_graph()?,
        };
        let handle = self.graph.insert(handle);

        if handle.context.is_suspended() {
            if let Err(e) = handle.context.resume() {
                warn!("audio context failed to resume: {e}");
                if let Some(mut h) = self.graph.take() {
                    if let Err(close) = h.context.close() {
                        warn!("{close}");
                    }
                }
                return Err(e);
            }
        }

        for slot in 0..OSCILLATOR_COUNT {
            match handle.start_oscillator(slot) {
                Transition::Applied => {}
                Transition::Redundant => trace!(slot, "oscillator already started"),
                Transition::Dropped => warn!(slot, "oscillator start dropped"),
            }
        }
        debug!(running = handle.running_oscillators(), "engine started");
        Ok(())
    }

    /// Stop every oscillator, drop them, and close the context.
    ///
    /// The handle is gone afterwards even if closing fails; the failure is
    /// returned so the caller can report it.
    pub fn stop(&mut self) -> EngineResult<()> {
        let Some(mut handle) = self.graph.take() else {
            trace!("stop requested while stopped");
            return Ok(());
        };

        for slot in 0..handle.oscillators.len() {
            if handle.stop_oscillator(slot) == Transition::Redundant {
                trace!(slot, "oscillator already stopped");
            }
        }
        handle.oscillators.clear();

        let closed = handle.context.close();
        drop(handle);
        debug!(ok = closed.is_ok(), "engine stopped");
        closed
    }

    /// Record `params`; while playing, glide the voices toward them.
    ///
    /// Fire-and-forget: a later `stop` does not wait for the glide.
    pub fn retune(&mut self, params: &SynthesisParameters) {
        self.params = *params;
        let Some(handle) = self.graph.as_mut() else {
            return;
        };
        #[allow(clippy::cast_possible_truncation)]
        let cmd = GraphCommand::Retune {
            targets_hz: params.harmonic_frequencies_hz.map(|f| f as f32),
            lfo_rate_hz: params.modulation_rate_hz as f32,
        };
        handle.send(cmd);
    }

    /// Set the volume (clamped to `[0, 1]`; non-finite values are ignored).
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.push_output_gain();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.push_output_gain();
    }

    fn push_output_gain(&mut self) {
        let gain = self.output_gain();
        if let Some(handle) = self.graph.as_mut() {
            handle.send(GraphCommand::SetMasterGain(gain));
        }
    }

    fn build_graph(&mut self) -> EngineResult<AudioGraphHandle<B::Context>> {
        let (commands, inbox) = command_channel();
        let tap = Arc::new(AnalysisTap::new());
        let graph = ToneGraph::new(&self.params, self.output_gain(), PROVISIONAL_SAMPLE_RATE);
        let context = self.backend.open(GraphRenderer::new(graph, inbox, Arc::clone(&tap)))?;
        debug!(sr = context.sample_rate(), root = self.params.root_frequency_hz, "audio graph built");
        Ok(AudioGraphHandle {
            context,
            commands,
            tap,
            oscillators: vec![OscillatorHandle::default(); OSCILLATOR_COUNT],
        })
    }

    /// Latest time-domain bytes, or a flat frame when not playing.
    pub fn analysis_frame(&self) -> AnalysisFrame {
        match &self.graph {
            Some(handle) if self.is_playing() => handle.tap.snapshot(),
            _ => FLAT_FRAME,
        }
    }

    /// `0` when muted, the volume otherwise.
    #[inline]
    pub fn output_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// True while a graph exists with every oscillator running.
    pub fn is_playing(&self) -> bool {
        self.graph.as_ref().is_some_and(|h| h.running_oscillators() == OSCILLATOR_COUNT)
    }

    /// Oscillators started and not yet stopped in the current session.
    pub fn running_oscillators(&self) -> usize {
        self.graph.as_ref().map_or(0, AudioGraphHandle::running_oscillators)
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    #[inline] pub fn volume(&self) -> f32 { self.volume }
    #[inline] pub fn is_muted(&self) -> bool { self.muted }
    #[inline] pub fn params(&self) -> &SynthesisParameters { &self.params }
    #[inline] pub fn backend(&self) -> &B { &self.backend }
}

impl<B: AudioBackend> Drop for SynthesisEngine<B> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("engine dropped with unclean teardown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{OfflineBackend, OfflineOptions};
    use crate::error::EngineError;
    use crate::graph::{OscState, LFO_SLOT};
    use cyclewave_core::cycle::compute_cycle;
    use cyclewave_core::mapping::map_to_parameters;

    fn engine(backend: &OfflineBackend) -> SynthesisEngine<OfflineBackend> {
        SynthesisEngine::new(backend.clone(), map_to_parameters(&compute_cycle(0.0)))
    }

    #[test]
    fn start_builds_resumes_and_starts_everything() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.start().unwrap();
        assert!(e.is_playing());
        assert_eq!(e.running_oscillators(), OSCILLATOR_COUNT);

        backend.render(16);
        let g = backend.graph().unwrap();
        for slot in 0..OSCILLATOR_COUNT {
            assert_eq!(g.oscillator_state(slot), Some(OscState::Running));
        }
        assert!(backend.render(4800).iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn double_start_is_redundant() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.start().unwrap();
        e.start().unwrap();
        assert_eq!(backend.contexts_opened(), 1);
        assert_eq!(e.running_oscillators(), OSCILLATOR_COUNT);
    }

    #[test]
    fn stop_then_start_builds_a_new_context() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.start().unwrap();
        e.stop().unwrap();
        assert!(!e.has_graph());
        assert_eq!(backend.live_contexts(), 0);
        assert_eq!(e.analysis_frame(), FLAT_FRAME);

        e.start().unwrap();
        assert_eq!(backend.contexts_opened(), 2);
        assert_eq!(backend.contexts_closed(), 1);
        assert_eq!(backend.live_contexts(), 1);
    }

    #[test]
    fn stop_while_stopped_is_ok() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.stop().unwrap();
        e.stop().unwrap();
        assert_eq!(backend.contexts_opened(), 0);
    }

    #[test]
    fn unsupported_platform_surfaces_and_leaves_no_graph() {
        let backend = OfflineBackend::unsupported();
        let mut e = engine(&backend);
        assert!(matches!(e.start(), Err(EngineError::UnsupportedPlatform(_))));
        assert!(!e.has_graph());
        assert!(!e.is_playing());
    }

    #[test]
    fn resume_failure_closes_the_new_context_and_leaves_no_graph() {
        let backend = OfflineBackend::new(OfflineOptions { fail_resume: true, ..OfflineOptions::default() });
        let mut e = engine(&backend);
        assert!(matches!(e.start(), Err(EngineError::UnsupportedPlatform(_))));
        assert!(!e.has_graph());
        assert!(!e.is_playing());
        assert_eq!(backend.contexts_opened(), 1);
        assert_eq!(backend.contexts_closed(), 1);
        assert_eq!(backend.live_contexts(), 0);
    }

    #[test]
    fn release_failure_is_reported_but_graph_is_gone() {
        let backend = OfflineBackend::new(OfflineOptions { fail_close: true, ..OfflineOptions::default() });
        let mut e = engine(&backend);
        e.start().unwrap();
        assert!(matches!(e.stop(), Err(EngineError::ResourceRelease(_))));
        assert!(!e.has_graph());
        assert_eq!(backend.live_contexts(), 0);
    }

    #[test]
    fn mute_zeroes_gain_and_unmute_restores_volume() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.set_volume(0.7);
        e.start().unwrap();

        e.set_muted(true);
        assert_eq!(e.output_gain(), 0.0);
        assert!(backend.render(2048).iter().all(|s| *s == 0.0));
        assert_eq!(e.running_oscillators(), OSCILLATOR_COUNT);

        e.set_muted(false);
        assert_eq!(e.output_gain(), 0.7);
        backend.render(1);
        assert_eq!(backend.graph().unwrap().master_gain(), 0.7);
    }

    #[test]
    fn volume_is_clamped_and_nan_ignored() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.set_volume(1.5);
        assert_eq!(e.volume(), 1.0);
        e.set_volume(-2.0);
        assert_eq!(e.volume(), 0.0);
        e.set_volume(f32::NAN);
        assert_eq!(e.volume(), 0.0);
    }

    #[test]
    fn retune_while_stopped_is_recorded_for_next_start() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        let later = map_to_parameters(&compute_cycle(150.0));
        e.retune(&later);
        assert_eq!(e.params(), &later);

        e.start().unwrap();
        let g = backend.graph().unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let expected = later.harmonic_frequencies_hz[0] as f32;
        assert_eq!(g.voice_frequency(0), Some(expected));
        assert!((g.lfo_rate() - later.modulation_rate_hz as f32).abs() < 1e-6);
    }

    #[test]
    fn retune_while_playing_sets_glide_targets() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        e.start().unwrap();
        let later = map_to_parameters(&compute_cycle(150.0));
        e.retune(&later);
        backend.render(1);
        let g = backend.graph().unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let target = later.harmonic_frequencies_hz[3] as f32;
        assert_eq!(g.voice_target(3), Some(target));
        assert_ne!(g.voice_frequency(3), Some(target));
        assert_eq!(g.oscillator_state(LFO_SLOT), Some(OscState::Running));
    }

    #[test]
    fn analysis_frame_follows_output() {
        let backend = OfflineBackend::default();
        let mut e = engine(&backend);
        assert_eq!(e.analysis_frame(), FLAT_FRAME);
        e.set_volume(1.0);
        e.start().unwrap();
        backend.render(4800);
        assert_ne!(e.analysis_frame(), FLAT_FRAME);
    }

    #[test]
    fn dropping_the_engine_releases_the_context() {
        let backend = OfflineBackend::default();
        {
            let mut e = engine(&backend);
            e.start().unwrap();
        }
        assert_eq!(backend.live_contexts(), 0);
    }
}
