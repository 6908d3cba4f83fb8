//! The host event loop: polls the scheduler, dispatches widget tasks, reads
//! keys, and paints the terminal.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use cyclewave_engine::{AudioBackend, Clock, IntervalScheduler, TaskKind, WidgetController};
use tracing::{debug, info, warn};

use crate::term::{status_lines, TextSurface};

/// Longest the loop sleeps between polls.
const MAX_WAIT: Duration = Duration::from_millis(50);
/// Terminal repaint period; scope frames in between only update state.
const PAINT_INTERVAL: Duration = Duration::from_millis(100);
const VOLUME_STEP: f32 = 0.05;

/// Wall clock for the widget: the system clock, or one pinned to a start
/// instant that then advances in real time.
pub enum HostClock {
    System,
    Pinned { at: f64, origin: Instant },
}

impl HostClock {
    pub fn new(pinned_at: Option<f64>) -> Self {
        match pinned_at {
            Some(at) => Self::Pinned { at, origin: Instant::now() },
            None => Self::System,
        }
    }
}

impl Clock for HostClock {
    fn unix_seconds(&self) -> f64 {
        match self {
            Self::System => cyclewave_engine::SystemClock.unix_seconds(),
            Self::Pinned { at, origin } => at + origin.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    TogglePlay,
    ToggleMute,
    VolumeUp,
    VolumeDown,
    Quit,
}

impl Key {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' | ' ' => Some(Self::TogglePlay),
            'm' => Some(Self::ToggleMute),
            '+' | '=' => Some(Self::VolumeUp),
            '-' | '_' => Some(Self::VolumeDown),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Spawn a reader that turns stdin lines into keys. The channel closes at EOF.
pub fn spawn_key_reader() -> Receiver<Key> {
    let (tx, rx) = channel::unbounded();
    let spawned = thread::Builder::new()
        .name("cyclewave-keys".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for key in line.chars().filter_map(Key::from_char) {
                    if tx.send(key).is_err() {
                        return;
                    }
                }
            }
            debug!("stdin closed");
        });
    if let Err(e) = spawned {
        warn!("key reader unavailable: {e}");
    }
    rx
}

pub struct HostOptions {
    pub duration: Option<Duration>,
    pub autoplay: bool,
}

/// Run until `q`, the optional duration, or forever.
///
/// `pump` is called with the time since the previous call; backends that are
/// not driven by a device use it to render audio.
pub fn run<B: AudioBackend>(
    mut widget: WidgetController<B, IntervalScheduler, HostClock>,
    scheduler: &IntervalScheduler,
    keys: Receiver<Key>,
    opts: &HostOptions,
    mut pump: impl FnMut(Duration),
) -> anyhow::Result<()> {
    let mut surface = TextSurface::for_layout(widget.state().compact);
    let origin = Instant::now();
    let mut last_pump = origin;
    let mut last_paint: Option<Instant> = None;
    let mut keys = Some(keys);

    if opts.autoplay {
        // a failure is shown in the status lines
        let _ = widget.start();
    }
    paint(&widget, &surface)?;

    loop {
        let now = Instant::now();
        pump(now - last_pump);
        last_pump = now;

        let elapsed = now - origin;
        if opts.duration.is_some_and(|d| elapsed >= d) {
            info!(secs = elapsed.as_secs(), "duration reached");
            break;
        }

        let mut repaint = false;
        for kind in scheduler.poll(elapsed) {
            widget.dispatch(kind, &mut surface);
            repaint |= kind == TaskKind::AnimationFrame
                && last_paint.map_or(true, |t| now - t >= PAINT_INTERVAL);
        }
        if repaint {
            paint(&widget, &surface)?;
            last_paint = Some(now);
        }

        let wait = scheduler.until_next().unwrap_or(MAX_WAIT).min(MAX_WAIT);
        let key = match keys.as_ref().map(|rx| rx.recv_timeout(wait)) {
            Some(Ok(key)) => Some(key),
            Some(Err(RecvTimeoutError::Timeout)) => None,
            Some(Err(RecvTimeoutError::Disconnected)) => {
                keys = None;
                None
            }
            None => {
                thread::sleep(wait);
                None
            }
        };

        match key {
            Some(Key::Quit) => break,
            Some(Key::TogglePlay) => {
                // a failure is shown in the status lines
                let _ = widget.toggle_play();
            }
            Some(Key::ToggleMute) => widget.toggle_mute(),
            Some(Key::VolumeUp) => widget.set_volume(widget.state().volume + VOLUME_STEP),
            Some(Key::VolumeDown) => widget.set_volume(widget.state().volume - VOLUME_STEP),
            None => continue,
        }
        paint(&widget, &surface)?;
    }

    widget.unmount();
    debug!(tasks = scheduler.active_tasks(), "host loop finished");
    Ok(())
}

fn paint<B: AudioBackend>(
    widget: &WidgetController<B, IntervalScheduler, HostClock>,
    surface: &TextSurface,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    // home + clear
    write!(out, "\x1b[H\x1b[2J")?;
    for line in status_lines(widget.state()) {
        writeln!(out, "{line}")?;
    }
    writeln!(out)?;
    for row in surface.lines() {
        writeln!(out, "|{row}|")?;
    }
    writeln!(out, "\n[p] play/stop  [m] mute  [+/-] volume  [q] quit   (then Enter)")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_from_chars() {
        assert_eq!(Key::from_char('P'), Some(Key::TogglePlay));
        assert_eq!(Key::from_char('m'), Some(Key::ToggleMute));
        assert_eq!(Key::from_char('+'), Some(Key::VolumeUp));
        assert_eq!(Key::from_char('-'), Some(Key::VolumeDown));
        assert_eq!(Key::from_char('q'), Some(Key::Quit));
        assert_eq!(Key::from_char('x'), None);
    }

    #[test]
    fn pinned_clock_starts_at_the_pin() {
        let c = HostClock::new(Some(150.0));
        let t = c.unix_seconds();
        assert!((150.0..151.0).contains(&t));
    }
}
