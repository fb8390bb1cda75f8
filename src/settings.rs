//! Leader settings persistence
//!
//! Stores the leader chord, both timeouts, the mapping table and the host's
//! shell commands in `~/.config/leader-keys/settings.yaml`.
//!
//! Older documents are migrated on load (see [`migrate`]). YAML is a JSON
//! superset, so a legacy JSON settings file loads through the same path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping as YamlMap, Value};

use crate::keymap::{Hotkey, Mapping, MappingError, MappingTable, Platform};

/// Idle timeout: abort leader mode after this long without a key
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
/// Chain debounce: wait this long before running an exact match that is also a prefix
pub const DEFAULT_MULTI_KEY_TIMEOUT_MS: u64 = 1000;

/// Errors from loading, saving or mutating settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("settings document must be a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("{0} must be greater than zero")]
    InvalidTimeout(&'static str),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Leader configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderSettings {
    version: u32,
    /// Chord that arms leader mode
    pub leader_key: Hotkey,
    timeout: u64,
    multi_key_timeout: u64,
    pub mappings: MappingTable,
    /// Host command registry extensions: id → shell command line
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,
}

impl LeaderSettings {
    pub const CURRENT_VERSION: u32 = 1;

    /// Idle timeout (always > 0)
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Chain debounce (always > 0)
    pub fn multi_key_timeout(&self) -> Duration {
        Duration::from_millis(self.multi_key_timeout)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout
    }

    pub fn multi_key_timeout_ms(&self) -> u64 {
        self.multi_key_timeout
    }

    pub fn set_timeout_ms(&mut self, ms: u64) -> Result<(), SettingsError> {
        if ms == 0 {
            return Err(SettingsError::InvalidTimeout("timeout"));
        }
        self.timeout = ms;
        Ok(())
    }

    pub fn set_multi_key_timeout_ms(&mut self, ms: u64) -> Result<(), SettingsError> {
        if ms == 0 {
            return Err(SettingsError::InvalidTimeout("multiKeyTimeout"));
        }
        self.multi_key_timeout = ms;
        Ok(())
    }

    /// Parse a settings document, migrating older schema shapes
    pub fn from_yaml_str(text: &str, platform: Platform) -> Result<Self, SettingsError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: Value = serde_yaml::from_str(text).map_err(SettingsError::Parse)?;
        let doc: SettingsDocument =
            serde_yaml::from_value(migrate(doc)?).map_err(SettingsError::Parse)?;
        Ok(doc.into_settings(platform))
    }

    pub fn to_yaml_string(&self) -> Result<String, SettingsError> {
        serde_yaml::to_string(self).map_err(SettingsError::Serialize)
    }

    /// Load settings from the default location, or return defaults
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::settings_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load settings from `path`. A missing file yields defaults; a broken
    /// file is an error so callers never overwrite it by accident.
    pub fn try_load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml_str(&content, Platform::current())?;
        tracing::info!(
            "Loaded settings from {} ({} mappings)",
            path.display(),
            settings.mappings.len()
        );
        Ok(settings)
    }

    /// Save settings to `path`, creating the parent directory
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = self.to_yaml_string()?;
        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = crate::config_paths::settings_file().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }
}

fn default_leader_key() -> Hotkey {
    Hotkey::default_leader()
}

impl Default for LeaderSettings {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            leader_key: default_leader_key(),
            timeout: DEFAULT_TIMEOUT_MS,
            multi_key_timeout: DEFAULT_MULTI_KEY_TIMEOUT_MS,
            mappings: MappingTable::new(),
            commands: BTreeMap::new(),
        }
    }
}

/// On-disk shape after migration; every field optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    #[serde(default = "default_leader_key")]
    leader_key: Hotkey,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_multi_key_timeout")]
    multi_key_timeout: u64,
    /// Decoded one by one so a single bad entry only drops itself
    #[serde(default)]
    mappings: Vec<Value>,
    #[serde(default)]
    commands: BTreeMap<String, String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_multi_key_timeout() -> u64 {
    DEFAULT_MULTI_KEY_TIMEOUT_MS
}

impl SettingsDocument {
    fn into_settings(self, platform: Platform) -> LeaderSettings {
        let timeout = positive_or_default("timeout", self.timeout, DEFAULT_TIMEOUT_MS);
        let multi_key_timeout = positive_or_default(
            "multiKeyTimeout",
            self.multi_key_timeout,
            DEFAULT_MULTI_KEY_TIMEOUT_MS,
        );

        LeaderSettings {
            version: LeaderSettings::CURRENT_VERSION,
            leader_key: self.leader_key.canonicalize(platform),
            timeout,
            multi_key_timeout,
            mappings: MappingTable::from_loaded(decode_mappings(self.mappings), platform),
            commands: self.commands,
        }
    }
}

fn decode_mappings(raw: Vec<Value>) -> Vec<Mapping> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_yaml::from_value::<Mapping>(value) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                tracing::warn!("Dropping unreadable mapping #{}: {}", idx + 1, e);
                None
            }
        })
        .collect()
}

fn positive_or_default(name: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        tracing::warn!("{} must be greater than zero, using {}ms", name, default);
        default
    } else {
        value
    }
}

/// Bring an older settings document up to [`LeaderSettings::CURRENT_VERSION`].
///
/// Version 0 mappings come in two shapes:
/// - `{trigger: Hotkey, commandId, commandName}`: one hotkey, one command
/// - `{trigger: [Hotkey], commands: [{id, name}]}`: chains without a `type` tag
///
/// Both become `{trigger: [Hotkey], actions: [{type: invoke, id, name}]}`.
/// A document with only comments is empty; any other non-mapping root is
/// an error.
pub fn migrate(doc: Value) -> Result<Value, SettingsError> {
    let mut root = match doc {
        Value::Mapping(root) => root,
        Value::Null => YamlMap::new(),
        Value::Sequence(_) => return Err(SettingsError::NotAMapping("a list")),
        Value::Tagged(_) => return Err(SettingsError::NotAMapping("a tagged value")),
        _ => return Err(SettingsError::NotAMapping("a scalar")),
    };

    let version = root.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version < 1 {
        if let Some(Value::Sequence(mappings)) = root.get_mut("mappings") {
            for mapping in mappings.iter_mut() {
                if let Value::Mapping(mapping) = mapping {
                    migrate_mapping_v0(mapping);
                }
            }
        }
        tracing::info!("Migrated settings from version {} to 1", version);
    }

    root.insert(
        Value::from("version"),
        Value::from(LeaderSettings::CURRENT_VERSION),
    );
    Ok(Value::Mapping(root))
}

fn migrate_mapping_v0(mapping: &mut YamlMap) {
    // Single-hotkey trigger → one-element sequence
    if let Some(trigger) = mapping.get_mut("trigger") {
        if trigger.is_mapping() {
            *trigger = Value::Sequence(vec![trigger.clone()]);
        }
    }

    let command_id = mapping.remove("commandId");
    let command_name = mapping.remove("commandName");

    if !mapping.contains_key("actions") {
        let commands = match (mapping.remove("commands"), command_id) {
            (Some(Value::Sequence(commands)), _) => commands,
            (_, Some(id)) => {
                let mut command = YamlMap::new();
                command.insert(Value::from("id"), id);
                if let Some(name) = command_name {
                    command.insert(Value::from("name"), name);
                }
                vec![Value::Mapping(command)]
            }
            _ => Vec::new(),
        };

        let actions = commands
            .into_iter()
            .map(|mut command| {
                if let Value::Mapping(fields) = &mut command {
                    if !fields.contains_key("type") {
                        fields.insert(Value::from("type"), Value::from("invoke"));
                    }
                }
                command
            })
            .collect();
        mapping.insert(Value::from("actions"), Value::Sequence(actions));
    }
}

/// Settings plus the file they persist to.
///
/// Every mutation works on a copy, saves it, then swaps it in; a rejected
/// mutation or a failed save leaves both memory and disk untouched.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: LeaderSettings,
}

impl SettingsStore {
    /// Open the store at `path` (missing file → defaults)
    pub fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let settings = LeaderSettings::try_load_from(&path)?;
        Ok(Self { path, settings })
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self, SettingsError> {
        let path = crate::config_paths::settings_file().ok_or(SettingsError::NoConfigDir)?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &LeaderSettings {
        &self.settings
    }

    pub fn into_settings(self) -> LeaderSettings {
        self.settings
    }

    pub fn add_mapping(&mut self, mapping: Mapping) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        next.mappings.add(mapping)?;
        self.commit(next)
    }

    pub fn update_mapping(&mut self, index: usize, mapping: Mapping) -> Result<Mapping, SettingsError> {
        let mut next = self.settings.clone();
        let previous = next.mappings.update(index, mapping)?;
        self.commit(next)?;
        Ok(previous)
    }

    pub fn remove_mapping(&mut self, index: usize) -> Result<Mapping, SettingsError> {
        let mut next = self.settings.clone();
        let removed = next.mappings.remove(index)?;
        self.commit(next)?;
        Ok(removed)
    }

    pub fn set_leader_key(&mut self, hotkey: Hotkey) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        next.leader_key = hotkey;
        self.commit(next)
    }

    /// Set either timeout; both are validated before anything changes
    pub fn set_timeouts(
        &mut self,
        timeout_ms: Option<u64>,
        multi_key_timeout_ms: Option<u64>,
    ) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        if let Some(ms) = timeout_ms {
            next.set_timeout_ms(ms)?;
        }
        if let Some(ms) = multi_key_timeout_ms {
            next.set_multi_key_timeout_ms(ms)?;
        }
        self.commit(next)
    }

    pub fn set_command(&mut self, id: String, command_line: String) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        next.commands.insert(id, command_line);
        self.commit(next)
    }

    fn commit(&mut self, next: LeaderSettings) -> Result<(), SettingsError> {
        next.save_to(&self.path)?;
        self.settings = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{parse_sequence, Action, Modifiers};

    fn parse(text: &str) -> LeaderSettings {
        LeaderSettings::from_yaml_str(text, Platform::Other).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = LeaderSettings::default();
        assert_eq!(settings.leader_key.label(), "SPACE");
        assert_eq!(settings.leader_key.mods, Modifiers::MOD);
        assert_eq!(settings.timeout(), Duration::from_millis(2000));
        assert!(settings.mappings.is_empty());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(parse(""), LeaderSettings::default());
        assert_eq!(parse("{}"), LeaderSettings::default());
    }

    #[test]
    fn test_current_document() {
        let settings = parse(
            r#"
version: 1
leaderKey: { modifiers: [Mod], key: SPACE }
timeout: 3000
multiKeyTimeout: 400
mappings:
  - trigger: [{ key: g }, { key: g }]
    actions:
      - { type: invoke, id: editor:top, name: Top }
      - { type: open, path: notes/today.md }
commands:
  term: alacritty
"#,
        );

        assert_eq!(settings.timeout_ms(), 3000);
        assert_eq!(settings.multi_key_timeout_ms(), 400);
        assert_eq!(settings.mappings.len(), 1);
        let mapping = settings.mappings.get(0).unwrap();
        assert_eq!(mapping.trigger, parse_sequence("g g", Platform::Other).unwrap());
        assert_eq!(mapping.actions[1], Action::open("notes/today.md"));
        assert_eq!(settings.commands.get("term").map(String::as_str), Some("alacritty"));
    }

    #[test]
    fn test_legacy_json_single_command_migrates() {
        let settings = parse(
            r#"{
  "leaderKey": { "modifiers": ["Mod"], "key": " " },
  "timeout": 2000,
  "mappings": [
    { "trigger": { "modifiers": [], "key": "T" }, "commandId": "daily:open", "commandName": "Open today" }
  ]
}"#,
        );

        assert_eq!(settings.leader_key.label(), "SPACE");
        let mapping = settings.mappings.get(0).unwrap();
        assert_eq!(mapping.trigger.len(), 1);
        assert_eq!(
            mapping.actions,
            vec![Action::invoke("daily:open").named("Open today")]
        );
    }

    #[test]
    fn test_legacy_untyped_commands_migrate() {
        let settings = parse(
            r#"
mappings:
  - trigger: [{ modifiers: [], key: "A" }]
    commands:
      - { id: one }
      - { type: open-file, path: x.md, name: X }
"#,
        );

        let mapping = settings.mappings.get(0).unwrap();
        assert_eq!(
            mapping.actions,
            vec![Action::invoke("one"), Action::open("x.md").named("X")]
        );
    }

    #[test]
    fn test_zero_timeouts_fall_back() {
        let settings = parse("timeout: 0\nmultiKeyTimeout: 0\n");
        assert_eq!(settings.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert_eq!(settings.multi_key_timeout_ms(), DEFAULT_MULTI_KEY_TIMEOUT_MS);
    }

    #[test]
    fn test_setters_reject_zero() {
        let mut settings = LeaderSettings::default();
        assert!(settings.set_timeout_ms(0).is_err());
        assert!(settings.set_multi_key_timeout_ms(0).is_err());
        assert_eq!(settings.timeout_ms(), DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_raw_ctrl_folds_on_load() {
        let settings = parse("leaderKey: { modifiers: [Ctrl], key: j }\n");
        assert_eq!(settings.leader_key.mods, Modifiers::MOD);
        assert_eq!(settings.leader_key.label(), "J");
    }

    #[test]
    fn test_round_trip_through_yaml() {
        let mut settings = LeaderSettings::default();
        settings
            .mappings
            .add(Mapping::single(
                parse_sequence("a b", Platform::Other).unwrap(),
                Action::invoke("x"),
            ))
            .unwrap();

        let text = settings.to_yaml_string().unwrap();
        assert_eq!(parse(&text), settings);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");

        let mut settings = LeaderSettings::default();
        settings.set_timeout_ms(1234).unwrap();
        settings.save_to(&path).unwrap();

        let loaded = LeaderSettings::try_load_from(&path).unwrap();
        assert_eq!(loaded.timeout_ms(), 1234);
    }

    #[test]
    fn test_broken_file_is_error_but_load_from_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "mappings: [ {").unwrap();

        assert!(LeaderSettings::try_load_from(&path).is_err());
        assert_eq!(LeaderSettings::load_from(&path), LeaderSettings::default());
    }

    #[test]
    fn test_store_rejected_mutation_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut store = SettingsStore::open(path.clone()).unwrap();
        let trigger = parse_sequence("a", Platform::current()).unwrap();

        store
            .add_mapping(Mapping::single(trigger.clone(), Action::invoke("x")))
            .unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();

        let result = store.add_mapping(Mapping::single(trigger, Action::invoke("y")));
        assert!(matches!(
            result,
            Err(SettingsError::Mapping(MappingError::Conflict(_)))
        ));
        assert_eq!(store.settings().mappings.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
    }

    #[test]
    fn test_store_set_timeouts_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.yaml")).unwrap();

        assert!(store.set_timeouts(Some(5000), Some(0)).is_err());
        assert_eq!(store.settings().timeout_ms(), DEFAULT_TIMEOUT_MS);

        store.set_timeouts(Some(5000), Some(250)).unwrap();
        assert_eq!(store.settings().timeout_ms(), 5000);
        assert_eq!(store.settings().multi_key_timeout_ms(), 250);
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        let err = LeaderSettings::from_yaml_str("- leaderKey: oops\n", Platform::Other).unwrap_err();
        assert!(matches!(err, SettingsError::NotAMapping("a list")));
        assert_eq!(
            err.to_string(),
            "settings document must be a mapping, found a list"
        );

        let err = LeaderSettings::from_yaml_str("hello", Platform::Other).unwrap_err();
        assert!(matches!(err, SettingsError::NotAMapping("a scalar")));

        // Comments only: nothing configured yet
        assert_eq!(parse("# leader settings\n"), LeaderSettings::default());
    }

    #[test]
    fn test_unreadable_mapping_drops_only_itself() {
        let settings = parse(
            r#"
version: 1
mappings:
  - trigger: [{ key: a }]
    actions: [{ type: url, id: x }]
  - trigger: [{ modifiers: [Hyper], key: c }]
    actions: [{ type: invoke, id: z }]
  - trigger: [{ key: b }]
    actions: [{ type: invoke, id: y }]
"#,
        );

        assert_eq!(settings.mappings.len(), 1);
        let mapping = settings.mappings.get(0).unwrap();
        assert_eq!(mapping.trigger, parse_sequence("b", Platform::Other).unwrap());
        assert_eq!(mapping.actions, vec![Action::invoke("y")]);
    }

    #[test]
    fn test_store_failed_save_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let mut store = SettingsStore::open(blocker.join("settings.yaml")).unwrap();
        // A plain file where the settings directory should go
        std::fs::write(&blocker, "not a directory").unwrap();

        let trigger = parse_sequence("a", Platform::current()).unwrap();
        let result = store.add_mapping(Mapping::single(trigger, Action::invoke("x")));
        assert!(matches!(result, Err(SettingsError::Write { .. })));
        assert!(store.settings().mappings.is_empty());

        let result = store.set_leader_key(Hotkey::parse("alt+l", Platform::current()).unwrap());
        assert!(matches!(result, Err(SettingsError::Write { .. })));
        assert_eq!(store.settings().leader_key, Hotkey::default_leader());

        let result = store.set_command("term".to_string(), "alacritty".to_string());
        assert!(result.is_err());
        assert!(store.settings().commands.is_empty());
    }
}
