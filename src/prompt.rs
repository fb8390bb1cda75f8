//! Command prompt opened by the `:` escape
//!
//! Typed text filters the command registry; accepting picks the best hit and
//! turns it into an `Action::Invoke` for [`LeaderMachine::run_prompted`].
//!
//! [`LeaderMachine::run_prompted`]: crate::leader::LeaderMachine::run_prompted

use crate::commands::{CommandEntry, CommandRegistry};
use crate::keymap::Action;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPrompt {
    query: String,
}

impl CommandPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Append typed text, dropping control characters
    pub fn push_str(&mut self, text: &str) {
        self.query.extend(text.chars().filter(|c| !c.is_control()));
    }

    pub fn backspace(&mut self) {
        self.query.pop();
    }

    pub fn matches<'r>(&self, registry: &'r CommandRegistry) -> Vec<&'r CommandEntry> {
        registry.search(&self.query)
    }

    /// Action for the best hit, if any
    pub fn accept(&self, registry: &CommandRegistry) -> Option<Action> {
        let entry = self.matches(registry).into_iter().next()?;
        Some(Action::invoke(entry.id.clone()).named(entry.label.clone()))
    }

    /// Title text: the query and the command Enter would run
    pub fn title(&self, registry: &CommandRegistry) -> String {
        match self.matches(registry).first() {
            Some(top) => format!(":{}  → {}", self.query, top.label),
            None => format!(":{}  (no match)", self.query),
        }
    }
}
