//! Actions bound to a trigger sequence
//!
//! The leader state machine never looks inside an [`Action`]; it forwards
//! each one to a [`Dispatcher`](crate::leader::Dispatcher).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One step of an action chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// Run a command from the host's named-command registry
    #[serde(alias = "obsidian", alias = "command")]
    Invoke {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Open a file or URL with the host's file-open capability
    #[serde(alias = "open-file")]
    Open {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Action {
    pub fn invoke(id: impl Into<String>) -> Self {
        Action::Invoke {
            id: id.into(),
            name: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Action::Open {
            path: path.into(),
            name: None,
        }
    }

    /// Attach a display name
    pub fn named(mut self, label: impl Into<String>) -> Self {
        match &mut self {
            Action::Invoke { name, .. } | Action::Open { name, .. } => {
                *name = Some(label.into());
            }
        }
        self
    }

    /// Display name, falling back to the id or path
    pub fn label(&self) -> String {
        match self {
            Action::Invoke { name: Some(name), .. } | Action::Open { name: Some(name), .. } => {
                name.clone()
            }
            Action::Invoke { id, .. } => id.clone(),
            Action::Open { path, .. } => format!("Open {}", path.display()),
        }
    }
}

/// Label for a whole chain: `Save → Close`
pub fn chain_label(actions: &[Action]) -> String {
    actions
        .iter()
        .map(Action::label)
        .collect::<Vec<_>>()
        .join(" → ")
}
