//! Leader-key sequence activation
//!
//! [`LeaderMachine`] consumes normalized [`Hotkey`](crate::keymap::Hotkey)s and
//! timer fires. Everything with side effects is behind a trait the host
//! implements: [`Dispatcher`] runs actions, [`StatusReporter`] shows state and
//! notices, [`Scheduler`] arms one-shot timers.

mod dispatch;
mod machine;
mod status;
mod timer;

pub use dispatch::{run_chain, ChainReport, DispatchError, Dispatcher};
pub use machine::{
    KeyOutcome, LeaderContext, LeaderMachine, MatchResult, HELP_KEY, PROMPT_KEY, TIMEOUT_NOTICE,
};
pub use status::{StatusReporter, NO_MAPPINGS_NOTICE};
pub use timer::{Clock, ManualClock, Scheduler, SystemClock, TimerId, TimerKind, TimerQueue};
