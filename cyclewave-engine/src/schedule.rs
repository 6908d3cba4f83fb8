//! Timer and frame-callback capabilities.
//!
//! The widget never spins its own threads or timers. It asks an injected
//! [`Scheduler`] for two repeating tasks and the host tells it when they fire.
//! [`IntervalScheduler`] is the stock single-threaded implementation: the host
//! polls it with its own monotonic clock and dispatches whatever is due.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{trace, warn};

/// The two periodic processes a mounted widget runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Recompute cycle and parameters.
    ParameterRefresh,
    /// Pull the analysis frame and redraw the scope.
    AnimationFrame,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

pub trait Scheduler {
    fn schedule_repeating(&mut self, kind: TaskKind, period: Duration) -> TaskId;

    /// Cancel a task. Unknown or already-cancelled ids are ignored.
    fn cancel(&mut self, id: TaskId);
}

#[derive(Debug)]
struct Entry {
    id: TaskId,
    kind: TaskKind,
    period: Duration,
    next_due: Duration,
}

#[derive(Debug, Default)]
struct Tasks {
    next_id: u64,
    now: Duration,
    entries: Vec<Entry>,
}

/// Deadline scheduler driven by the host's elapsed time.
///
/// Clones share one task table, so the host keeps a clone to poll while the
/// widget owns another to schedule and cancel. Not `Send`: it lives on the
/// host's event loop.
#[derive(Clone, Debug, Default)]
pub struct IntervalScheduler {
    tasks: Rc<RefCell<Tasks>>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `elapsed` (monotonic, from any fixed origin) and return the
    /// kinds that came due, in schedule order. A task that missed several
    /// periods fires once and is re-armed after `elapsed`.
    pub fn poll(&self, elapsed: Duration) -> Vec<TaskKind> {
        let mut tasks = self.tasks.borrow_mut();
        if elapsed < tasks.now {
            warn!(?elapsed, now = ?tasks.now, "scheduler polled with time going backwards");
            return Vec::new();
        }
        tasks.now = elapsed;

        let mut due = Vec::new();
        for e in &mut tasks.entries {
            if e.next_due <= elapsed {
                due.push(e.kind);
                while e.next_due <= elapsed {
                    e.next_due += e.period;
                }
            }
        }
        due
    }

    /// Time until the next task is due, if any task is scheduled.
    pub fn until_next(&self) -> Option<Duration> {
        let tasks = self.tasks.borrow();
        tasks.entries.iter().map(|e| e.next_due.saturating_sub(tasks.now)).min()
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks.borrow().entries.len()
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule_repeating(&mut self, kind: TaskKind, period: Duration) -> TaskId {
        let mut tasks = self.tasks.borrow_mut();
        tasks.next_id += 1;
        let id = TaskId(tasks.next_id);
        let period = period.max(Duration::from_millis(1));
        let next_due = tasks.now + period;
        tasks.entries.push(Entry { id, kind, period, next_due });
        trace!(?id, ?kind, ?period, "task scheduled");
        id
    }

    fn cancel(&mut self, id: TaskId) {
        let mut tasks = self.tasks.borrow_mut();
        let before = tasks.entries.len();
        tasks.entries.retain(|e| e.id != id);
        if tasks.entries.len() == before {
            trace!(?id, "cancel of unknown task ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn tasks_fire_on_their_period() {
        let mut s = IntervalScheduler::new();
        s.schedule_repeating(TaskKind::ParameterRefresh, ms(2000));
        s.schedule_repeating(TaskKind::AnimationFrame, ms(16));

        assert!(s.poll(ms(10)).is_empty());
        assert_eq!(s.poll(ms(16)), vec![TaskKind::AnimationFrame]);
        assert_eq!(s.poll(ms(2000)), vec![TaskKind::ParameterRefresh, TaskKind::AnimationFrame]);
        assert_eq!(s.until_next(), Some(ms(16)));
    }

    #[test]
    fn missed_periods_coalesce() {
        let mut s = IntervalScheduler::new();
        s.schedule_repeating(TaskKind::AnimationFrame, ms(10));
        assert_eq!(s.poll(ms(95)), vec![TaskKind::AnimationFrame]);
        assert_eq!(s.until_next(), Some(ms(5)));
    }

    #[test]
    fn cancel_is_idempotent_and_shared_between_clones() {
        let mut s = IntervalScheduler::new();
        let host = s.clone();
        let id = s.schedule_repeating(TaskKind::ParameterRefresh, ms(5));
        assert_eq!(host.active_tasks(), 1);
        s.cancel(id);
        s.cancel(id);
        assert_eq!(host.active_tasks(), 0);
        assert!(host.poll(ms(100)).is_empty());
        assert_eq!(host.until_next(), None);
    }

    #[test]
    fn backwards_time_is_ignored() {
        let mut s = IntervalScheduler::new();
        s.schedule_repeating(TaskKind::AnimationFrame, ms(10));
        assert_eq!(s.poll(ms(20)).len(), 1);
        assert!(s.poll(ms(5)).is_empty());
    }
}
