//! Wall-clock capability.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock {
    /// Seconds since the Unix epoch; negative before it.
    fn unix_seconds(&self) -> f64;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        }
    }
}

/// A clock that only moves when told to. Clones share the time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    secs: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn at(unix_seconds: f64) -> Self {
        Self { secs: Rc::new(Cell::new(unix_seconds)) }
    }

    pub fn set(&self, unix_seconds: f64) {
        self.secs.set(unix_seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.secs.set(self.secs.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn unix_seconds(&self) -> f64 {
        self.secs.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let c = ManualClock::at(10.0);
        let view = c.clone();
        c.advance(2.5);
        assert_eq!(view.unix_seconds(), 12.5);
        c.set(0.0);
        assert_eq!(view.unix_seconds(), 0.0);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.unix_seconds() > 1_577_836_800.0);
    }
}
