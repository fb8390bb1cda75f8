//! MappingTable: the ordered collection of trigger → chain mappings
//!
//! Matching scans every entry and never depends on order. The table is kept
//! sorted (shorter triggers first, then by display string) for listings.

use serde::{Deserialize, Serialize};

use super::mapping::Mapping;
use super::sequence::{display_order, is_prefix, sequence_display, sequences_equal, Sequence};
use super::types::{Hotkey, Platform};

/// A mutation was refused because its trigger is already taken
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Sequence \"{}\" is already mapped to \"{}\".",
    sequence_display(.trigger),
    .existing.chain_display()
)]
pub struct MappingConflict {
    /// The trigger that was being added or edited in
    pub trigger: Sequence,
    /// The mapping that already owns the trigger
    pub existing: Mapping,
}

/// Errors from add/update/remove
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error(transparent)]
    Conflict(#[from] MappingConflict),
    #[error("Trigger sequence cannot be empty.")]
    EmptyTrigger,
    #[error("Command chain cannot be empty.")]
    EmptyChain,
    #[error("No mapping at index {index} (table has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// The mapping table consulted on every keystroke while leader mode is active
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    mappings: Vec<Mapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from validated mappings, refusing any conflict
    pub fn with_mappings(mappings: Vec<Mapping>) -> Result<Self, MappingError> {
        let mut table = Self::new();
        for mapping in mappings {
            table.add(mapping)?;
        }
        Ok(table)
    }

    /// Build a table from freshly loaded settings.
    ///
    /// Hotkeys are re-folded for `platform`. Invalid entries and later
    /// duplicates of an earlier trigger are dropped with a warning.
    pub fn from_loaded(mappings: Vec<Mapping>, platform: Platform) -> Self {
        let mut table = Self::new();
        for mapping in mappings {
            let mapping = mapping.canonicalize(platform);
            if !mapping.is_valid() {
                tracing::warn!(
                    "Dropping mapping with empty trigger or chain: {:?}",
                    mapping
                );
                continue;
            }
            if let Some(existing) = table.find_exact(&mapping.trigger) {
                tracing::warn!(
                    "Dropping duplicate mapping for \"{}\" (already mapped to \"{}\")",
                    mapping.trigger_display(),
                    existing.chain_display()
                );
                continue;
            }
            table.mappings.push(mapping);
        }
        table.sort();
        table
    }

    /// Mappings whose trigger starts with `sequence`
    pub fn find_by_prefix(&self, sequence: &[Hotkey]) -> Vec<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| is_prefix(sequence, &m.trigger))
            .collect()
    }

    /// The mapping whose trigger equals `sequence`, if any
    pub fn find_exact(&self, sequence: &[Hotkey]) -> Option<&Mapping> {
        self.mappings
            .iter()
            .find(|m| sequences_equal(sequence, &m.trigger))
    }

    /// The mapping other than `except` that already owns `trigger`
    pub fn conflict_for(&self, trigger: &[Hotkey], except: Option<usize>) -> Option<&Mapping> {
        self.mappings
            .iter()
            .enumerate()
            .find(|(i, m)| Some(*i) != except && sequences_equal(trigger, &m.trigger))
            .map(|(_, m)| m)
    }

    /// Add a mapping; rejected if its trigger collides with an existing one
    pub fn add(&mut self, mapping: Mapping) -> Result<(), MappingError> {
        self.check(&mapping, None)?;
        tracing::debug!("Adding mapping {}", mapping.trigger_display());
        self.mappings.push(mapping);
        self.sort();
        Ok(())
    }

    /// Replace the mapping at `index`, returning the previous one
    pub fn update(&mut self, index: usize, mapping: Mapping) -> Result<Mapping, MappingError> {
        self.check_index(index)?;
        self.check(&mapping, Some(index))?;
        tracing::debug!("Updating mapping #{} to {}", index, mapping.trigger_display());
        let previous = std::mem::replace(&mut self.mappings[index], mapping);
        self.sort();
        Ok(previous)
    }

    /// Remove the mapping at `index`
    pub fn remove(&mut self, index: usize) -> Result<Mapping, MappingError> {
        self.check_index(index)?;
        let removed = self.mappings.remove(index);
        tracing::debug!("Removed mapping {}", removed.trigger_display());
        Ok(removed)
    }

    pub fn get(&self, index: usize) -> Option<&Mapping> {
        self.mappings.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// `(trigger, chain)` display pairs for the help listing
    pub fn help_rows(&self) -> Vec<(String, String)> {
        self.mappings
            .iter()
            .map(|m| (m.trigger_display(), m.chain_display()))
            .collect()
    }

    fn check(&self, mapping: &Mapping, except: Option<usize>) -> Result<(), MappingError> {
        if mapping.trigger.is_empty() {
            return Err(MappingError::EmptyTrigger);
        }
        if mapping.actions.is_empty() {
            return Err(MappingError::EmptyChain);
        }
        if let Some(existing) = self.conflict_for(&mapping.trigger, except) {
            return Err(MappingConflict {
                trigger: mapping.trigger.clone(),
                existing: existing.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), MappingError> {
        if index < self.mappings.len() {
            Ok(())
        } else {
            Err(MappingError::IndexOutOfRange {
                index,
                len: self.mappings.len(),
            })
        }
    }

    fn sort(&mut self) {
        self.mappings.sort_by(|a, b| display_order(&a.trigger, &b.trigger));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::action::Action;
    use crate::keymap::sequence::parse_sequence;

    fn seq(text: &str) -> Sequence {
        parse_sequence(text, Platform::Other).unwrap()
    }

    fn mapping(trigger: &str, id: &str) -> Mapping {
        Mapping::single(seq(trigger), Action::invoke(id))
    }

    #[test]
    fn test_find_by_prefix() {
        let table = MappingTable::with_mappings(vec![
            mapping("a", "x"),
            mapping("a b", "y"),
            mapping("c", "z"),
        ])
        .unwrap();

        assert_eq!(table.find_by_prefix(&seq("a")).len(), 2);
        assert_eq!(table.find_by_prefix(&seq("a b")).len(), 1);
        assert_eq!(table.find_by_prefix(&[]).len(), 3);
        assert!(table.find_by_prefix(&seq("a c")).is_empty());
    }

    #[test]
    fn test_find_exact() {
        let table =
            MappingTable::with_mappings(vec![mapping("a", "x"), mapping("a b", "y")]).unwrap();

        assert_eq!(table.find_exact(&seq("a")).unwrap().actions[0], Action::invoke("x"));
        assert!(table.find_exact(&seq("b")).is_none());
        assert!(table.find_exact(&[]).is_none());
    }

    #[test]
    fn test_add_duplicate_rejected_and_table_unchanged() {
        let mut table = MappingTable::with_mappings(vec![mapping("a", "x")]).unwrap();
        let before = table.clone();

        let err = table.add(mapping("a", "other")).unwrap_err();
        match err {
            MappingError::Conflict(conflict) => {
                assert_eq!(conflict.existing.actions[0], Action::invoke("x"));
                assert_eq!(conflict.to_string(), "Sequence \"A\" is already mapped to \"x\".");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(table, before);
    }

    #[test]
    fn test_update_may_keep_own_trigger() {
        let mut table =
            MappingTable::with_mappings(vec![mapping("a", "x"), mapping("b", "y")]).unwrap();
        let idx = table.iter().position(|m| m.trigger == seq("a")).unwrap();

        let previous = table.update(idx, mapping("a", "x2")).unwrap();
        assert_eq!(previous.actions[0], Action::invoke("x"));
        assert_eq!(table.find_exact(&seq("a")).unwrap().actions[0], Action::invoke("x2"));
    }

    #[test]
    fn test_update_into_other_trigger_rejected() {
        let mut table =
            MappingTable::with_mappings(vec![mapping("a", "x"), mapping("b", "y")]).unwrap();
        let idx = table.iter().position(|m| m.trigger == seq("a")).unwrap();

        assert!(matches!(
            table.update(idx, mapping("b", "x")),
            Err(MappingError::Conflict(_))
        ));
        assert_eq!(table.len(), 2);
        assert!(table.find_exact(&seq("a")).is_some());
    }

    #[test]
    fn test_empty_trigger_and_chain_rejected() {
        let mut table = MappingTable::new();
        assert_eq!(
            table.add(Mapping::single(vec![], Action::invoke("x"))),
            Err(MappingError::EmptyTrigger)
        );
        assert_eq!(table.add(Mapping::new(seq("a"), vec![])), Err(MappingError::EmptyChain));
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut table = MappingTable::with_mappings(vec![mapping("a", "x")]).unwrap();
        assert!(matches!(
            table.remove(3),
            Err(MappingError::IndexOutOfRange { index: 3, len: 1 })
        ));
        table.remove(0).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_sorted_by_length_then_display() {
        let table = MappingTable::with_mappings(vec![
            mapping("b c", "1"),
            mapping("z", "2"),
            mapping("a", "3"),
            mapping("a b", "4"),
        ])
        .unwrap();

        let order: Vec<String> = table.iter().map(|m| m.trigger_display()).collect();
        assert_eq!(order, vec!["A", "Z", "A B", "B C"]);
    }

    #[test]
    fn test_from_loaded_drops_invalid_and_duplicates() {
        let table = MappingTable::from_loaded(
            vec![
                mapping("a", "first"),
                mapping("a", "second"),
                Mapping::new(seq("b"), vec![]),
            ],
            Platform::Other,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().actions[0], Action::invoke("first"));
    }

    #[test]
    fn test_help_rows() {
        let table = MappingTable::with_mappings(vec![Mapping::new(
            seq("t"),
            vec![Action::invoke("a").named("Today"), Action::invoke("b")],
        )])
        .unwrap();
        assert_eq!(
            table.help_rows(),
            vec![("T".to_string(), "Today → b".to_string())]
        );
    }
}
