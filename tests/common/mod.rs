//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use leader_keys::keymap::{parse_sequence, Action, Hotkey, Mapping, Platform};
use leader_keys::leader::{
    DispatchError, Dispatcher, KeyOutcome, LeaderContext, LeaderMachine, ManualClock,
    StatusReporter, TimerQueue,
};
use leader_keys::settings::LeaderSettings;

/// Everything the machine told its collaborators, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Active,
    Sequence(String),
    Inactive,
    Notice(String),
    Prompt,
    Ran(String),
    Failed(String),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Reporter that appends to a shared log
pub struct RecordingReporter {
    pub log: EventLog,
}

impl StatusReporter for RecordingReporter {
    fn on_leader_active(&mut self) {
        self.log.borrow_mut().push(Event::Active);
    }

    fn on_sequence_updated(&mut self, sequence: &[Hotkey]) {
        let text = sequence
            .iter()
            .map(Hotkey::label)
            .collect::<Vec<_>>()
            .join(" ");
        self.log.borrow_mut().push(Event::Sequence(text));
    }

    fn on_leader_inactive(&mut self) {
        self.log.borrow_mut().push(Event::Inactive);
    }

    fn on_notice(&mut self, message: &str) {
        self.log.borrow_mut().push(Event::Notice(message.to_string()));
    }

    fn on_command_prompt(&mut self) {
        self.log.borrow_mut().push(Event::Prompt);
    }
}

/// Dispatcher that records action labels; ids in `failing` return an error
pub struct RecordingDispatcher {
    pub log: EventLog,
    pub failing: HashSet<String>,
}

impl Dispatcher for RecordingDispatcher {
    fn run(&mut self, action: &Action) -> Result<(), DispatchError> {
        let label = action.label();
        if let Action::Invoke { id, .. } = action {
            if self.failing.contains(id) {
                self.log.borrow_mut().push(Event::Failed(label));
                return Err(DispatchError::UnknownCommand(id.clone()));
            }
        }
        self.log.borrow_mut().push(Event::Ran(label));
        Ok(())
    }
}

/// Leader machine wired to a virtual clock and recording fakes
pub struct Harness {
    pub machine: LeaderMachine,
    pub settings: LeaderSettings,
    pub clock: ManualClock,
    pub timers: TimerQueue<ManualClock>,
    pub reporter: RecordingReporter,
    pub dispatcher: RecordingDispatcher,
    pub log: EventLog,
}

impl Harness {
    /// Leader Mod+Space, timeout 2000ms, multi-key timeout 500ms
    pub fn new(mappings: &[(&str, &[&str])]) -> Self {
        let mut settings = LeaderSettings::default();
        settings.set_timeout_ms(2000).unwrap();
        settings.set_multi_key_timeout_ms(500).unwrap();
        for (trigger, ids) in mappings {
            settings
                .mappings
                .add(mapping(trigger, ids))
                .unwrap();
        }
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: LeaderSettings) -> Self {
        let clock = ManualClock::new();
        let log: EventLog = Rc::default();
        Self {
            machine: LeaderMachine::new(),
            settings,
            timers: TimerQueue::with_clock(clock.clone()),
            clock,
            reporter: RecordingReporter {
                log: Rc::clone(&log),
            },
            dispatcher: RecordingDispatcher {
                log: Rc::clone(&log),
                failing: HashSet::new(),
            },
            log,
        }
    }

    pub fn fail(&mut self, id: &str) {
        self.dispatcher.failing.insert(id.to_string());
    }

    /// Run `f` against the machine with a fresh context
    pub fn with_cx<R>(&mut self, f: impl FnOnce(&mut LeaderMachine, &mut LeaderContext<'_>) -> R) -> R {
        let mut cx = LeaderContext {
            settings: &self.settings,
            dispatcher: &mut self.dispatcher,
            reporter: &mut self.reporter,
            timers: &mut self.timers,
        };
        f(&mut self.machine, &mut cx)
    }

    pub fn press(&mut self, text: &str) -> KeyOutcome {
        let key = Hotkey::parse(text, Platform::current()).unwrap();
        self.with_cx(|machine, cx| machine.handle_key(&key, cx))
    }

    pub fn leader(&mut self) -> KeyOutcome {
        self.press("mod+space")
    }

    /// Advance the clock and deliver every timer that came due
    pub fn wait(&mut self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        while let Some((id, _)) = self.timers.pop_expired() {
            self.with_cx(|machine, cx| machine.handle_timer(id, cx));
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn ran(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Ran(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Notice(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Mapping from whitespace-separated trigger text to invoke actions
pub fn mapping(trigger: &str, ids: &[&str]) -> Mapping {
    Mapping::new(
        parse_sequence(trigger, Platform::current()).unwrap(),
        ids.iter().map(|id| Action::invoke(*id)).collect(),
    )
}
