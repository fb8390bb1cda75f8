//! Cancellable one-shot timers over an injectable clock
//!
//! The state machine only sees [`Scheduler`]. The host owns a [`TimerQueue`],
//! pops due timers with [`TimerQueue::pop_expired`] on its event loop and
//! feeds them back one at a time, so a fire that cancels another timer takes
//! effect before the next one is popped.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Handle returned by [`Scheduler::arm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// The two independent timeout regimes of a leader session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// No key arrived in time; abort the session
    IdleTimeout,
    /// Nobody extended an exact-but-ambiguous match; run it
    ChainDebounce,
}

/// Arm and cancel one-shot timers
pub trait Scheduler {
    fn arm(&mut self, kind: TimerKind, after: Duration) -> TimerId;

    /// Cancelling a timer that already fired or was never armed is a no-op
    fn cancel(&mut self, id: TimerId);
}

/// Source of "now"
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to
///
/// Clones share the same time, so a test can keep one and hand another to a
/// [`TimerQueue`].
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
struct PendingTimer {
    id: TimerId,
    kind: TimerKind,
    deadline: Instant,
}

/// Deadline-ordered timer set
#[derive(Debug)]
pub struct TimerQueue<C: Clock = SystemClock> {
    clock: C,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TimerQueue<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimerQueue<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Remove and return the earliest timer whose deadline has passed.
    ///
    /// Ties on deadline pop in arming order.
    pub fn pop_expired(&mut self) -> Option<(TimerId, TimerKind)> {
        let now = self.clock.now();
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        let timer = self.pending.swap_remove(idx);
        Some((timer.id, timer.kind))
    }

    /// Earliest outstanding deadline (for `ControlFlow::WaitUntil`)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn arm(&mut self, kind: TimerKind, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = self.clock.now() + after;
        tracing::trace!("Armed {:?} #{} for {:?}", kind, id.0, after);
        self.pending.push(PendingTimer { id, kind, deadline });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|t| t.id != id);
    }
}
