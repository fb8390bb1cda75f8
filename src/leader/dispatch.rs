//! Action dispatch: the host's side of running a chain

use crate::keymap::Action;

use super::status::StatusReporter;

/// Executes one action. Implemented by the host.
pub trait Dispatcher {
    fn run(&mut self, action: &Action) -> Result<(), DispatchError>;
}

/// Why a single action failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("failed to start {id}: {message}")]
    Spawn { id: String, message: String },
    #[error("failed to open {path}: {message}")]
    Open { path: String, message: String },
    #[error("{0}")]
    Other(String),
}

/// Outcome of a best-effort chain run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub attempted: usize,
    /// `(position in chain, error)` for every action that failed
    pub failures: Vec<(usize, DispatchError)>,
}

impl ChainReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every action in order. A failing action is logged and reported, and
/// the rest of the chain still runs.
pub fn run_chain(
    actions: &[Action],
    dispatcher: &mut dyn Dispatcher,
    reporter: &mut dyn StatusReporter,
) -> ChainReport {
    let mut report = ChainReport::default();

    for (idx, action) in actions.iter().enumerate() {
        report.attempted += 1;
        match dispatcher.run(action) {
            Ok(()) => tracing::debug!("Ran action {}: {}", idx, action.label()),
            Err(e) => {
                tracing::warn!("Action {} ({}) failed: {}", idx, action.label(), e);
                reporter.on_action_failed(action, &e);
                report.failures.push((idx, e));
            }
        }
    }

    report
}
