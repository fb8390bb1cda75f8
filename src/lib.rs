//! Leader keys - press a chord, then type a short key sequence
//!
//! This crate provides the leader-key state machine, the mapping table it
//! matches against, settings persistence and the pieces the `leader` host
//! binary is built from.

pub mod cli;
pub mod commands;
pub mod config_paths;
pub mod fs_watcher;
pub mod keymap;
pub mod leader;
pub mod prompt;
pub mod settings;
pub mod simulate;
pub mod status_line;
pub mod tracing;

// Re-export commonly used types
pub use keymap::{Action, Hotkey, Mapping, MappingTable};
pub use leader::{LeaderContext, LeaderMachine};
pub use settings::{LeaderSettings, SettingsStore};
