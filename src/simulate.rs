//! Dry-run replay of key presses through the leader state machine
//!
//! Runs on a [`ManualClock`], so `wait:<ms>` steps are instant and timers
//! fire at exactly their deadlines. Nothing is spawned or opened; each
//! action that would run is written to the transcript instead.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::commands::CommandRegistry;
use crate::keymap::{sequence_display, Action, Hotkey, KeyParseError, Platform};
use crate::leader::{
    Clock, DispatchError, Dispatcher, LeaderContext, LeaderMachine, ManualClock, StatusReporter,
    TimerQueue,
};
use crate::settings::LeaderSettings;

/// One scripted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(Hotkey),
    Wait(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum StepParseError {
    #[error("invalid wait step {0:?}, expected wait:<ms>")]
    InvalidWait(String),
    #[error(transparent)]
    Key(#[from] KeyParseError),
}

impl Step {
    /// `wait:<ms>` (an optional `ms` suffix is accepted) or hotkey text
    pub fn parse(text: &str, platform: Platform) -> Result<Self, StepParseError> {
        if let Some(ms) = text.trim().strip_prefix("wait:") {
            let ms = ms.trim().trim_end_matches("ms");
            return ms
                .parse::<u64>()
                .map(|ms| Step::Wait(Duration::from_millis(ms)))
                .map_err(|_| StepParseError::InvalidWait(text.to_string()));
        }
        Ok(Step::Key(Hotkey::parse(text, platform)?))
    }
}

type Sink = Rc<RefCell<Vec<String>>>;

struct Transcript {
    sink: Sink,
    clock: ManualClock,
    start: Instant,
}

impl Transcript {
    fn line(&self, text: impl AsRef<str>) {
        let elapsed = self.clock.now().saturating_duration_since(self.start);
        self.sink
            .borrow_mut()
            .push(format!("[{:>6}ms] {}", elapsed.as_millis(), text.as_ref()));
    }
}

impl StatusReporter for Transcript {
    fn on_leader_active(&mut self) {
        self.line("leader active");
    }

    fn on_sequence_updated(&mut self, sequence: &[Hotkey]) {
        if !sequence.is_empty() {
            self.line(format!("sequence: {}", sequence_display(sequence)));
        }
    }

    fn on_leader_inactive(&mut self) {
        self.line("leader inactive");
    }

    fn on_notice(&mut self, message: &str) {
        for text in message.lines() {
            self.line(format!("notice: {}", text));
        }
    }

    fn on_command_prompt(&mut self) {
        self.line("command prompt opened");
    }
}

struct DryRun<'a> {
    registry: &'a CommandRegistry,
    transcript: Transcript,
}

impl Dispatcher for DryRun<'_> {
    fn run(&mut self, action: &Action) -> Result<(), DispatchError> {
        if let Action::Invoke { id, .. } = action {
            if self.registry.get(id).is_none() {
                return Err(DispatchError::UnknownCommand(id.clone()));
            }
        }
        self.transcript.line(format!("run: {}", action.label()));
        Ok(())
    }
}

/// Replay `steps` against `settings` and return the transcript
pub fn simulate(settings: &LeaderSettings, steps: &[Step]) -> Vec<String> {
    let registry = CommandRegistry::new(&settings.commands);
    let clock = ManualClock::new();
    let start = clock.now();
    let sink: Sink = Rc::new(RefCell::new(Vec::new()));
    let transcript = || Transcript {
        sink: Rc::clone(&sink),
        clock: clock.clone(),
        start,
    };

    let mut timers = TimerQueue::with_clock(clock.clone());
    let mut machine = LeaderMachine::new();
    let mut reporter = transcript();
    let mut dispatcher = DryRun {
        registry: &registry,
        transcript: transcript(),
    };

    for step in steps {
        match step {
            Step::Key(key) => {
                reporter.line(format!("key {}", key.display_string()));
                let mut cx = LeaderContext {
                    settings,
                    dispatcher: &mut dispatcher,
                    reporter: &mut reporter,
                    timers: &mut timers,
                };
                if !machine.handle_key(key, &mut cx).is_consumed() {
                    reporter.line("passed through");
                }
            }
            Step::Wait(duration) => {
                let target = clock.now() + *duration;
                // Fire timers in deadline order, each at its own deadline
                while let Some(deadline) = timers.next_deadline().filter(|d| *d <= target) {
                    clock.advance(deadline.saturating_duration_since(clock.now()));
                    while let Some((id, _)) = timers.pop_expired() {
                        let mut cx = LeaderContext {
                            settings,
                            dispatcher: &mut dispatcher,
                            reporter: &mut reporter,
                            timers: &mut timers,
                        };
                        machine.handle_timer(id, &mut cx);
                    }
                }
                clock.advance(target.saturating_duration_since(clock.now()));
            }
        }
    }

    if machine.is_active() {
        reporter.line(format!(
            "still active with sequence \"{}\"",
            sequence_display(machine.sequence())
        ));
    }

    drop(reporter);
    drop(dispatcher);
    Rc::try_unwrap(sink)
        .map(RefCell::into_inner)
        .unwrap_or_else(|sink| sink.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{parse_sequence, Mapping};

    fn settings() -> LeaderSettings {
        let mut settings = LeaderSettings::default();
        settings.set_multi_key_timeout_ms(500).unwrap();
        for (trigger, id) in [("a", "leader:help"), ("a b", "app:quit")] {
            settings
                .mappings
                .add(Mapping::single(
                    parse_sequence(trigger, Platform::current()).unwrap(),
                    Action::invoke(id),
                ))
                .unwrap();
        }
        settings
    }

    fn steps(text: &[&str]) -> Vec<Step> {
        text.iter()
            .map(|s| Step::parse(s, Platform::current()).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            Step::parse("wait:250", Platform::Other).unwrap(),
            Step::Wait(Duration::from_millis(250))
        );
        assert_eq!(
            Step::parse("wait:250ms", Platform::Other).unwrap(),
            Step::Wait(Duration::from_millis(250))
        );
        assert!(matches!(
            Step::parse("wait:soon", Platform::Other),
            Err(StepParseError::InvalidWait(_))
        ));
        assert!(matches!(
            Step::parse("g", Platform::Other).unwrap(),
            Step::Key(_)
        ));
    }

    #[test]
    fn test_debounce_fires_at_deadline() {
        let transcript = simulate(&settings(), &steps(&["mod+space", "a", "wait:1000"]));
        assert!(transcript.iter().any(|l| l == "[   500ms] run: leader:help"));
        assert!(!transcript.iter().any(|l| l.contains("run: app:quit")));
    }

    #[test]
    fn test_longer_trigger_wins() {
        let transcript = simulate(&settings(), &steps(&["mod+space", "a", "wait:100", "b"]));
        assert!(transcript.iter().any(|l| l.ends_with("run: app:quit")));
        assert!(!transcript.iter().any(|l| l.ends_with("run: leader:help")));
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let mut settings = LeaderSettings::default();
        settings
            .mappings
            .add(Mapping::single(
                parse_sequence("x", Platform::current()).unwrap(),
                Action::invoke("nope"),
            ))
            .unwrap();

        let transcript = simulate(&settings, &steps(&["mod+space", "x"]));
        assert!(transcript
            .iter()
            .any(|l| l.ends_with("notice: Leader: nope failed: unknown command: nope")));
    }

    #[test]
    fn test_ignored_key_and_open_session() {
        let transcript = simulate(&settings(), &steps(&["q", "mod+space"]));
        assert!(transcript.iter().any(|l| l.ends_with("passed through")));
        assert!(transcript.last().is_some_and(|l| l.contains("still active")));
    }
}
