//! Sequence comparison: equality, prefix relation and display ordering
//!
//! All functions are total. Length mismatches answer `false`, never panic.

use std::cmp::Ordering;

use super::types::{Hotkey, KeyParseError, Platform};

/// Ordered list of hotkeys typed after the leader chord
pub type Sequence = Vec<Hotkey>;

/// Two hotkeys are equal when key label and modifier set match
#[inline]
pub fn hotkeys_equal(a: &Hotkey, b: &Hotkey) -> bool {
    a == b
}

/// Positional equality at every index
pub fn sequences_equal(a: &[Hotkey], b: &[Hotkey]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| hotkeys_equal(x, y))
}

/// `prefix` is a prefix of `full` (the empty sequence is a prefix of everything)
pub fn is_prefix(prefix: &[Hotkey], full: &[Hotkey]) -> bool {
    prefix.len() <= full.len() && prefix.iter().zip(full).all(|(x, y)| hotkeys_equal(x, y))
}

/// Display a sequence for the given platform, e.g. `G G` or `Mod + K T`
pub fn sequence_display_for(sequence: &[Hotkey], platform: Platform) -> String {
    sequence
        .iter()
        .map(|h| h.display_for(platform))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display a sequence using the current platform's symbols
pub fn sequence_display(sequence: &[Hotkey]) -> String {
    sequence_display_for(sequence, Platform::current())
}

/// Table order: shorter triggers first, then by display string
pub fn display_order(a: &[Hotkey], b: &[Hotkey]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| sequence_display(a).cmp(&sequence_display(b)))
}

/// Parse a whitespace-separated sequence of hotkey strings, e.g. `"g shift+g"`
pub fn parse_sequence(text: &str, platform: Platform) -> Result<Sequence, KeyParseError> {
    text.split_whitespace()
        .map(|part| Hotkey::parse(part, platform))
        .collect()
}
