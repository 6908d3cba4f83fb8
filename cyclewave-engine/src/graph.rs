//! Realtime tone graph.
//!
//! Fixed topology, built once per play session and only retuned afterwards:
//!
//! ```text
//!   LFO (sine) ── ×10 Hz ──┬──────┬──────┬──────┐   (shared vibrato)
//!                          ▼      ▼      ▼      ▼
//!                   sine ×1  sine ×1.5  tri ×2  sine ×0.5
//!                     │0.28     │0.14     │0.09    │0.18
//!                     └─────────┴────┬────┴────────┘
//!                               master gain ── analysis tap ── output
//! ```
//!
//! The UI side never touches the graph directly: it sends [`GraphCommand`]s
//! through a lock-free SPSC ring, and the renderer drains them at the start of
//! every block. No allocation happens on the audio thread.

use std::sync::Arc;

use cyclewave_core::dsp::kill_denormals;
use cyclewave_core::glide::Glide;
use cyclewave_core::mapping::{SynthesisParameters, VOICE_COUNT};

use crate::analysis::AnalysisTap;
use crate::nodes::{Lfo, Osc, Wave};

/// Waveform of each tone voice.
pub const VOICE_WAVES: [Wave; VOICE_COUNT] = [Wave::Sine, Wave::Sine, Wave::Triangle, Wave::Sine];

/// Fixed relative level of each tone voice.
pub const VOICE_GAINS: [f32; VOICE_COUNT] = [0.28, 0.14, 0.09, 0.18];

/// Vibrato depth the LFO adds to every tone frequency.
pub const LFO_DEPTH_HZ: f32 = 10.0;

/// Time constant of the retune glide.
pub const GLIDE_TIME_CONSTANT_S: f32 = 0.5;

/// Oscillator slot of the LFO; tone voices use `0..VOICE_COUNT`.
pub const LFO_SLOT: usize = VOICE_COUNT;

/// Tone voices plus the LFO.
pub const OSCILLATOR_COUNT: usize = VOICE_COUNT + 1;

/// Capacity of the UI → audio command ring.
pub const COMMAND_CAPACITY: usize = 64;

/// Anything that can generate one sample at a time.
pub trait Generator {
    /// Called when the graph is (re)initialized or when the sample rate changes.
    fn reset(&mut self, sr: f32);

    /// Generate the next mono sample.
    fn next(&mut self) -> f32;
}

/// Messages from the engine to the audio thread.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GraphCommand {
    StartOscillator(usize),
    StopOscillator(usize),
    /// Glide targets for the tone voices plus a direct LFO rate.
    Retune { targets_hz: [f32; VOICE_COUNT], lfo_rate_hz: f32 },
    SetMasterGain(f32),
}

/// Lifecycle of one oscillator. `Finished` is terminal: a stopped oscillator
/// is never restarted, a new session builds new ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OscState { Idle, Running, Finished }

impl OscState {
    #[inline]
    fn start(&mut self) {
        if *self == Self::Idle {
            *self = Self::Running;
        }
    }

    #[inline]
    fn stop(&mut self) {
        *self = Self::Finished;
    }
}

#[derive(Copy, Clone, Debug)]
struct Voice {
    osc: Osc,
    gain: f32,
    glide: Glide,
    state: OscState,
}

/// Four tone voices, one LFO, one master gain.
#[derive(Copy, Clone, Debug)]
pub struct ToneGraph {
    sr: f32,
    voices: [Voice; VOICE_COUNT],
    lfo: Lfo,
    lfo_state: OscState,
    master: f32,
}

impl ToneGraph {
    /// Build the graph tuned to `params`, every oscillator idle.
    pub fn new(params: &SynthesisParameters, master_gain: f32, sr: f32) -> Self {
        let sr = sr.max(1.0);
        let voices = core::array::from_fn(|i| {
            #[allow(clippy::cast_possible_truncation)]
            let f = params.harmonic_frequencies_hz[i] as f32;
            let mut glide = Glide::new(GLIDE_TIME_CONSTANT_S, sr);
            glide.jump_to(f);
            Voice { osc: Osc::new(f, VOICE_WAVES[i]), gain: VOICE_GAINS[i], glide, state: OscState::Idle }
        });
        #[allow(clippy::cast_possible_truncation)]
        let lfo = Lfo::sine(params.modulation_rate_hz as f32);
        Self { sr, voices, lfo, lfo_state: OscState::Idle, master: master_gain.max(0.0) }
    }

    pub fn apply(&mut self, cmd: GraphCommand) {
        match cmd {
            GraphCommand::StartOscillator(slot) => {
                if let Some(state) = self.state_mut(slot) {
                    state.start();
                }
            }
            GraphCommand::StopOscillator(slot) => {
                if let Some(state) = self.state_mut(slot) {
                    state.stop();
                }
            }
            GraphCommand::Retune { targets_hz, lfo_rate_hz } => {
                for (v, t) in self.voices.iter_mut().zip(targets_hz) {
                    v.glide.set_target(t.max(0.0));
                }
                self.lfo.set_rate(lfo_rate_hz);
            }
            GraphCommand::SetMasterGain(g) => self.master = g.max(0.0),
        }
    }

    fn state_mut(&mut self, slot: usize) -> Option<&mut OscState> {
        match slot {
            LFO_SLOT => Some(&mut self.lfo_state),
            i => self.voices.get_mut(i).map(|v| &mut v.state),
        }
    }

    pub fn oscillator_state(&self, slot: usize) -> Option<OscState> {
        match slot {
            LFO_SLOT => Some(self.lfo_state),
            i => self.voices.get(i).map(|v| v.state),
        }
    }

    /// Current (gliding) base frequency of a tone voice, without vibrato.
    pub fn voice_frequency(&self, voice: usize) -> Option<f32> {
        self.voices.get(voice).map(|v| v.glide.value())
    }

    /// Glide target of a tone voice.
    pub fn voice_target(&self, voice: usize) -> Option<f32> {
        self.voices.get(voice).map(|v| v.glide.target())
    }

    #[inline] pub fn lfo_rate(&self) -> f32 { self.lfo.rate() }
    #[inline] pub fn master_gain(&self) -> f32 { self.master }
    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }
}

impl Generator for ToneGraph {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        for v in &mut self.voices {
            v.glide.set_sample_rate(self.sr);
        }
    }

    #[inline]
    fn next(&mut self) -> f32 {
        let sr = self.sr;
        let vibrato = if self.lfo_state == OscState::Running {
            self.lfo.next(sr) * LFO_DEPTH_HZ
        } else {
            0.0
        };

        let mut sum = 0.0;
        for v in &mut self.voices {
            // glides keep moving even before start, like an automated param
            let base = v.glide.next();
            if v.state == OscState::Running {
                v.osc.set_freq(base + vibrato);
                sum += v.osc.next(sr) * v.gain;
            }
        }
        kill_denormals(sum * self.master)
    }
}

/// Create the UI → audio command ring.
pub fn command_channel() -> (rtrb::Producer<GraphCommand>, rtrb::Consumer<GraphCommand>) {
    rtrb::RingBuffer::new(COMMAND_CAPACITY)
}

/// Audio-thread half of a play session: the graph, its command inbox and the
/// analysis tap it feeds. Backends move this into their callback.
pub struct GraphRenderer {
    graph: ToneGraph,
    commands: rtrb::Consumer<GraphCommand>,
    tap: Arc<AnalysisTap>,
}

impl GraphRenderer {
    pub fn new(graph: ToneGraph, commands: rtrb::Consumer<GraphCommand>, tap: Arc<AnalysisTap>) -> Self {
        Self { graph, commands, tap }
    }

    /// Tell the graph the device rate. Cheap no-op if unchanged.
    #[inline]
    pub fn set_sample_rate(&mut self, sr: f32) {
        if (sr - self.graph.sample_rate()).abs() > f32::EPSILON {
            self.graph.reset(sr);
        }
    }

    /// Apply every pending command. Returns how many were applied.
    pub fn drain_commands(&mut self) -> usize {
        let mut n = 0;
        while let Ok(cmd) = self.commands.pop() {
            self.graph.apply(cmd);
            n += 1;
        }
        n
    }

    /// Next mono sample; also feeds the analysis tap.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let s = self.graph.next();
        self.tap.push(s);
        s
    }

    /// Drain commands, then fill `out` with mono samples.
    pub fn render(&mut self, out: &mut [f32]) {
        self.drain_commands();
        for s in out.iter_mut() {
            *s = self.next_sample();
        }
    }

    #[inline] pub fn graph(&self) -> &ToneGraph { &self.graph }
}

impl core::fmt::Debug for GraphRenderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphRenderer")
            .field("sr", &self.graph.sample_rate())
            .field("pending", &self.commands.slots())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclewave_core::cycle::compute_cycle;
    use cyclewave_core::mapping::map_to_parameters;

    const SR: f32 = 48_000.0;

    fn renderer(master: f32) -> (rtrb::Producer<GraphCommand>, GraphRenderer, Arc<AnalysisTap>) {
        let params = map_to_parameters(&compute_cycle(0.0));
        let (tx, rx) = command_channel();
        let tap = Arc::new(AnalysisTap::new());
        let r = GraphRenderer::new(ToneGraph::new(&params, master, SR), rx, Arc::clone(&tap));
        (tx, r, tap)
    }

    fn start_all(tx: &mut rtrb::Producer<GraphCommand>) {
        for slot in 0..OSCILLATOR_COUNT {
            tx.push(GraphCommand::StartOscillator(slot)).unwrap();
        }
    }

    fn peak(buf: &[f32]) -> f32 {
        buf.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn idle_graph_is_silent() {
        let (_tx, mut r, _tap) = renderer(0.45);
        let mut buf = vec![1.0; 512];
        r.render(&mut buf);
        assert_eq!(peak(&buf), 0.0);
    }

    #[test]
    fn started_graph_sounds_within_headroom() {
        let (mut tx, mut r, tap) = renderer(1.0);
        start_all(&mut tx);
        let mut buf = vec![0.0; 4800];
        r.render(&mut buf);
        let p = peak(&buf);
        let headroom: f32 = VOICE_GAINS.iter().sum();
        assert!(p > 0.05 && p <= headroom + 1e-3, "peak={p}");
        assert_ne!(tap.snapshot(), crate::analysis::FLAT_FRAME);
    }

    #[test]
    fn master_gain_zero_silences_without_stopping() {
        let (mut tx, mut r, _tap) = renderer(0.45);
        start_all(&mut tx);
        tx.push(GraphCommand::SetMasterGain(0.0)).unwrap();
        let mut buf = vec![0.0; 1024];
        r.render(&mut buf);
        assert_eq!(peak(&buf), 0.0);
        for slot in 0..OSCILLATOR_COUNT {
            assert_eq!(r.graph().oscillator_state(slot), Some(OscState::Running));
        }
    }

    #[test]
    fn retune_glides_instead_of_jumping() {
        let (mut tx, mut r, _tap) = renderer(0.45);
        start_all(&mut tx);
        let f0 = r.graph().voice_frequency(0).unwrap();
        tx.push(GraphCommand::Retune { targets_hz: [2.0 * f0, 3.0 * f0, 4.0 * f0, f0], lfo_rate_hz: 0.3 })
            .unwrap();

        let mut buf = vec![0.0; 1];
        r.render(&mut buf);
        let f1 = r.graph().voice_frequency(0).unwrap();
        assert!(f1 - f0 < 0.1, "first step must be tiny: {f0} -> {f1}");
        assert!((r.graph().lfo_rate() - 0.3).abs() < 1e-6);

        let mut buf = vec![0.0; SR as usize * 10];
        r.render(&mut buf);
        let settled = r.graph().voice_frequency(0).unwrap();
        assert!((settled - 2.0 * f0).abs() < 0.01, "settled={settled}");
        let top = r.graph().voice_frequency(2).unwrap();
        assert!((top - 4.0 * f0).abs() < 0.01, "top voice settled={top}");
    }

    #[test]
    fn stopped_oscillator_cannot_restart() {
        let (mut tx, mut r, _tap) = renderer(0.45);
        tx.push(GraphCommand::StartOscillator(1)).unwrap();
        tx.push(GraphCommand::StopOscillator(1)).unwrap();
        tx.push(GraphCommand::StartOscillator(1)).unwrap();
        tx.push(GraphCommand::StartOscillator(99)).unwrap();
        assert_eq!(r.drain_commands(), 4);
        assert_eq!(r.graph().oscillator_state(1), Some(OscState::Finished));
        assert_eq!(r.graph().oscillator_state(99), None);
    }

    #[test]
    fn sample_rate_change_keeps_frequencies() {
        let (_tx, mut r, _tap) = renderer(0.45);
        let before = r.graph().voice_frequency(2);
        r.set_sample_rate(44_100.0);
        assert_eq!(r.graph().sample_rate(), 44_100.0);
        assert_eq!(r.graph().voice_frequency(2), before);
    }
}
