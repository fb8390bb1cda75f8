//! The leader state machine
//!
//! Idle until the leader chord arrives, then Active: every key is consumed and
//! appended to the sequence, which is matched against the mapping table after
//! each press. Two timers bound a session:
//! - idle timeout: no key for `timeout` aborts the session
//! - chain debounce: an exact match that is also a prefix of a longer trigger
//!   runs after `multiKeyTimeout` unless another key extends it
//!
//! Every exit goes through [`LeaderMachine::exit`], which clears the sequence,
//! cancels both timers and reports the session inactive. Chains run after the
//! exit, so actions always observe leader mode as closed.

use std::time::Duration;

use crate::keymap::{hotkeys_equal, sequence_display, Action, Hotkey};
use crate::settings::LeaderSettings;

use super::dispatch::{run_chain, ChainReport, Dispatcher};
use super::status::StatusReporter;
use super::timer::{Scheduler, TimerId, TimerKind};

/// Key that lists the mappings when pressed on an empty sequence
pub const HELP_KEY: &str = "?";
/// Key that opens the command prompt when pressed on an empty sequence
pub const PROMPT_KEY: &str = ":";

/// Notice shown when the idle timeout aborts a session
pub const TIMEOUT_NOTICE: &str = "Leader mode timed out.";

/// Collaborators the machine borrows for the duration of one event
pub struct LeaderContext<'a> {
    pub settings: &'a LeaderSettings,
    pub dispatcher: &'a mut dyn Dispatcher,
    pub reporter: &'a mut dyn StatusReporter,
    pub timers: &'a mut dyn Scheduler,
}

/// Whether the host should suppress its own handling of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed,
    Ignored,
}

impl KeyOutcome {
    pub fn is_consumed(self) -> bool {
        self == KeyOutcome::Consumed
    }
}

/// What the last matching step decided, for callers that care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Partial,
    Ambiguous,
    Exact,
}

/// Per-session state; `None` in the machine means Idle
#[derive(Debug)]
struct LeaderSession {
    sequence: Vec<Hotkey>,
    idle_timer: Option<TimerId>,
    debounce_timer: Option<TimerId>,
    /// Chain of the exact match waiting on the debounce
    pending: Option<Vec<Action>>,
    /// Snapshotted on entry; settings changes apply from the next session
    timeout: Duration,
    multi_key_timeout: Duration,
}

impl LeaderSession {
    fn cancel_timers(&mut self, timers: &mut dyn Scheduler) {
        if let Some(id) = self.idle_timer.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.debounce_timer.take() {
            timers.cancel(id);
        }
    }
}

#[derive(Debug, Default)]
pub struct LeaderMachine {
    session: Option<LeaderSession>,
    last_match: Option<MatchResult>,
}

impl LeaderMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The in-progress sequence (empty when Idle)
    pub fn sequence(&self) -> &[Hotkey] {
        self.session.as_ref().map_or(&[], |s| s.sequence.as_slice())
    }

    /// Whether an ambiguous exact match is waiting on the chain debounce
    pub fn has_pending_chain(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.pending.is_some())
    }

    /// Result of the most recent matching step
    pub fn last_match(&self) -> Option<MatchResult> {
        self.last_match
    }

    /// Feed one normalized key press
    pub fn handle_key(&mut self, key: &Hotkey, cx: &mut LeaderContext<'_>) -> KeyOutcome {
        if self.session.is_none() {
            if hotkeys_equal(key, &cx.settings.leader_key) {
                self.enter(cx);
                return KeyOutcome::Consumed;
            }
            return KeyOutcome::Ignored;
        }

        let Some(session) = self.session.as_mut() else {
            return KeyOutcome::Ignored;
        };
        session.cancel_timers(cx.timers);

        if session.sequence.is_empty() {
            if key.label() == HELP_KEY {
                tracing::debug!("Leader: help requested");
                self.exit(cx);
                cx.reporter.on_help(&cx.settings.mappings);
                return KeyOutcome::Consumed;
            }
            if key.label() == PROMPT_KEY {
                tracing::debug!("Leader: command prompt requested");
                self.exit(cx);
                cx.reporter.on_command_prompt();
                return KeyOutcome::Consumed;
            }
        }

        // A new key supersedes whatever was waiting on the debounce
        session.pending = None;
        session.sequence.push(key.clone());
        cx.reporter.on_sequence_updated(&session.sequence);

        let settings = cx.settings;
        let candidates = settings.mappings.find_by_prefix(&session.sequence);
        let exact = candidates
            .iter()
            .find(|m| m.trigger.len() == session.sequence.len());
        let has_longer = candidates
            .iter()
            .any(|m| m.trigger.len() > session.sequence.len());

        match (exact, has_longer) {
            (None, false) => {
                let shown = sequence_display(&session.sequence);
                tracing::debug!("Leader: no mapping for {}", shown);
                self.last_match = Some(MatchResult::NoMatch);
                self.exit(cx);
                cx.reporter
                    .on_notice(&format!("Leader: No mapping for \"{}\"", shown));
            }
            (None, true) => {
                self.last_match = Some(MatchResult::Partial);
                session.idle_timer = Some(cx.timers.arm(TimerKind::IdleTimeout, session.timeout));
            }
            (Some(mapping), true) => {
                tracing::debug!(
                    "Leader: {} matched, waiting {:?} for a longer trigger",
                    mapping.trigger_display(),
                    session.multi_key_timeout
                );
                self.last_match = Some(MatchResult::Ambiguous);
                session.pending = Some(mapping.actions.clone());
                session.debounce_timer = Some(
                    cx.timers
                        .arm(TimerKind::ChainDebounce, session.multi_key_timeout),
                );
                session.idle_timer = Some(cx.timers.arm(TimerKind::IdleTimeout, session.timeout));
            }
            (Some(mapping), false) => {
                tracing::debug!("Leader: {} matched", mapping.trigger_display());
                self.last_match = Some(MatchResult::Exact);
                let actions = mapping.actions.clone();
                self.exit(cx);
                run_chain(&actions, cx.dispatcher, cx.reporter);
            }
        }

        KeyOutcome::Consumed
    }

    /// Deliver a fired timer. Ids that no longer belong to the session are ignored.
    pub fn handle_timer(&mut self, id: TimerId, cx: &mut LeaderContext<'_>) -> Option<ChainReport> {
        let session = self.session.as_mut()?;

        if session.debounce_timer == Some(id) {
            session.debounce_timer = None;
            let actions = session.pending.take();
            self.exit(cx);
            return actions.map(|actions| run_chain(&actions, cx.dispatcher, cx.reporter));
        }

        if session.idle_timer == Some(id) {
            session.idle_timer = None;
            // An exact match waiting on the debounce still runs
            if let Some(actions) = session.pending.take() {
                tracing::debug!("Leader: idle timeout with a pending chain, running it");
                self.exit(cx);
                return Some(run_chain(&actions, cx.dispatcher, cx.reporter));
            }
            tracing::debug!("Leader: idle timeout");
            self.exit(cx);
            cx.reporter.on_notice(TIMEOUT_NOTICE);
            return None;
        }

        tracing::trace!("Ignoring stale timer {:?}", id);
        None
    }

    /// Leave leader mode. Safe to call when already Idle.
    pub fn exit(&mut self, cx: &mut LeaderContext<'_>) {
        if let Some(mut session) = self.session.take() {
            session.cancel_timers(cx.timers);
            tracing::debug!("Leader mode inactive");
        }
        cx.reporter.on_leader_inactive();
    }

    /// Dispatch an action picked from the command prompt, bypassing the table
    pub fn run_prompted(&mut self, action: Action, cx: &mut LeaderContext<'_>) -> ChainReport {
        if self.is_active() {
            self.exit(cx);
        }
        tracing::debug!("Leader: running prompted action {}", action.label());
        run_chain(std::slice::from_ref(&action), cx.dispatcher, cx.reporter)
    }

    fn enter(&mut self, cx: &mut LeaderContext<'_>) {
        let timeout = cx.settings.timeout();
        let idle_timer = cx.timers.arm(TimerKind::IdleTimeout, timeout);
        self.session = Some(LeaderSession {
            sequence: Vec::new(),
            idle_timer: Some(idle_timer),
            debounce_timer: None,
            pending: None,
            timeout,
            multi_key_timeout: cx.settings.multi_key_timeout(),
        });
        self.last_match = None;
        tracing::debug!("Leader mode active");
        cx.reporter.on_leader_active();
        cx.reporter.on_sequence_updated(&[]);
    }
}
