//! Status reporting: best-effort notifications of state-machine transitions

use crate::keymap::{Action, Hotkey, MappingTable};

use super::dispatch::DispatchError;

/// Message shown for `?` when no mappings exist
pub const NO_MAPPINGS_NOTICE: &str = "No hotkeys configured.";

/// Observer of leader transitions (status line, toasts)
///
/// Calls are fire-and-forget; the state machine ignores how they are shown.
pub trait StatusReporter {
    fn on_leader_active(&mut self);
    fn on_sequence_updated(&mut self, sequence: &[Hotkey]);
    fn on_leader_inactive(&mut self);
    fn on_notice(&mut self, message: &str);

    fn on_action_failed(&mut self, action: &Action, error: &DispatchError) {
        self.on_notice(&format!("Leader: {} failed: {}", action.label(), error));
    }

    /// `?` pressed on an empty sequence
    fn on_help(&mut self, table: &MappingTable) {
        if table.is_empty() {
            self.on_notice(NO_MAPPINGS_NOTICE);
            return;
        }
        let listing = table
            .help_rows()
            .into_iter()
            .map(|(trigger, chain)| format!("{trigger}: {chain}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.on_notice(&listing);
    }

    /// `:` pressed on an empty sequence; the host opens its command search
    fn on_command_prompt(&mut self) {}
}
