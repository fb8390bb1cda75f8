//! Mapping struct: a trigger sequence bound to an action chain

use serde::{Deserialize, Serialize};

use super::action::{chain_label, Action};
use super::sequence::{sequence_display, Sequence};
use super::types::Platform;

/// A trigger sequence (typed after the leader chord) and the chain it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    pub trigger: Sequence,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Mapping {
    pub fn new(trigger: Sequence, actions: Vec<Action>) -> Self {
        Self { trigger, actions }
    }

    /// Single-action mapping
    pub fn single(trigger: Sequence, action: Action) -> Self {
        Self::new(trigger, vec![action])
    }

    /// Both the trigger and the chain are non-empty
    pub fn is_valid(&self) -> bool {
        !self.trigger.is_empty() && !self.actions.is_empty()
    }

    /// Re-fold raw Ctrl/Meta in every trigger key for the given platform
    pub fn canonicalize(self, platform: Platform) -> Self {
        Self {
            trigger: self
                .trigger
                .into_iter()
                .map(|h| h.canonicalize(platform))
                .collect(),
            actions: self.actions,
        }
    }

    /// Trigger as shown to the user, e.g. `G G`
    pub fn trigger_display(&self) -> String {
        sequence_display(&self.trigger)
    }

    /// Chain as shown to the user, e.g. `Save → Close`
    pub fn chain_display(&self) -> String {
        chain_label(&self.actions)
    }
}
