//! Key types and the leader mapping table
//!
//! This module provides everything the leader state machine matches against:
//! - Canonical hotkeys with platform "primary modifier" folding (Cmd on macOS, Ctrl elsewhere)
//! - Sequence comparison (equality, prefix relation, display order)
//! - The mapping table of trigger sequences → action chains
//!
//! # Architecture
//!
//! ```text
//! winit::KeyEvent → RawKeyPress → normalize() → Hotkey → MappingTable::find_by_prefix()
//! ```

mod action;
mod mapping;
mod normalize;
mod sequence;
mod table;
mod types;
mod winit_adapter;

pub use action::{chain_label, Action};
pub use mapping::Mapping;
pub use normalize::{normalize, RawKeyPress};
pub use sequence::{
    display_order, hotkeys_equal, is_prefix, parse_sequence, sequence_display,
    sequence_display_for, sequences_equal, Sequence,
};
pub use table::{MappingConflict, MappingError, MappingTable};
pub use types::{canonical_key_label, Hotkey, KeyParseError, Modifiers, Platform};
pub use winit_adapter::{hotkey_from_winit, raw_press_from_winit};
