//! Core types for the keymap system: Hotkey, Modifiers, Platform

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which modifier acts as the "primary" one (folded into `Mod`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS / iOS: Cmd (Meta) is primary
    Apple,
    /// Everything else: Ctrl is primary
    Other,
}

impl Platform {
    /// The platform this binary was compiled for
    pub const fn current() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Platform::Apple
        } else {
            Platform::Other
        }
    }

    /// The raw modifier that gets folded into `Mod` on this platform
    pub const fn primary(self) -> Modifiers {
        match self {
            Platform::Apple => Modifiers::META,
            Platform::Other => Modifiers::CTRL,
        }
    }
}

/// Modifier keys as a bitfield; a set with no duplicates by construction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    /// Synthetic primary modifier (Cmd on Apple, Ctrl elsewhere)
    pub const MOD: Modifiers = Modifiers(0b0_0001);
    /// Ctrl when it is *not* the platform's primary modifier
    pub const CTRL: Modifiers = Modifiers(0b0_0010);
    /// Meta/Cmd/Win when it is *not* the platform's primary modifier
    pub const META: Modifiers = Modifiers(0b0_0100);
    pub const ALT: Modifiers = Modifiers(0b0_1000);
    pub const SHIFT: Modifiers = Modifiers(0b1_0000);

    /// Display priority: primary, secondary ctrl-or-meta, alt, shift
    const ORDER: [(Modifiers, &'static str); 5] = [
        (Modifiers::MOD, "Mod"),
        (Modifiers::CTRL, "Ctrl"),
        (Modifiers::META, "Meta"),
        (Modifiers::ALT, "Alt"),
        (Modifiers::SHIFT, "Shift"),
    ];

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Fold the platform's raw primary modifier into `Mod`.
    ///
    /// Once folded, neither raw Ctrl nor raw Meta survives if either was the
    /// primary one.
    pub fn fold_primary(self, platform: Platform) -> Modifiers {
        if self.contains(platform.primary()) {
            self.without(Modifiers::CTRL)
                .without(Modifiers::META)
                .union(Modifiers::MOD)
        } else {
            self
        }
    }

    /// Modifier names in display priority order
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::ORDER
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }

    /// Look up a single modifier by its canonical (or aliased) name
    pub fn from_name(name: &str, platform: Platform) -> Option<Modifiers> {
        match name.to_ascii_lowercase().as_str() {
            "mod" | "primary" => Some(Modifiers::MOD),
            "cmd" | "command" => Some(match platform {
                Platform::Apple => Modifiers::MOD,
                Platform::Other => Modifiers::META,
            }),
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "meta" | "super" | "win" => Some(Modifiers::META),
            "alt" | "option" | "opt" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().collect::<Vec<_>>().join("+"))
    }
}

/// Canonical label for a key: `SPACE` for the space bar, upper-cased otherwise.
///
/// Returns `None` for an empty label.
pub fn canonical_key_label(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw == " " || raw.eq_ignore_ascii_case("space") {
        return Some("SPACE".to_string());
    }
    Some(raw.to_uppercase())
}

/// A single key press: a canonical key label with its modifier set
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "HotkeyRepr", into = "HotkeyRepr")]
pub struct Hotkey {
    pub mods: Modifiers,
    key: String,
}

impl Hotkey {
    /// Create a hotkey, canonicalising the key label.
    ///
    /// Returns `None` when the label is empty.
    pub fn new(key: &str, mods: Modifiers) -> Option<Self> {
        canonical_key_label(key).map(|key| Self { mods, key })
    }

    /// Hotkey with no modifiers
    pub fn key(key: &str) -> Option<Self> {
        Self::new(key, Modifiers::NONE)
    }

    /// `Mod + SPACE`, the default leader chord
    pub fn default_leader() -> Self {
        Self {
            mods: Modifiers::MOD,
            key: "SPACE".to_string(),
        }
    }

    /// Canonical key label (never empty)
    pub fn label(&self) -> &str {
        &self.key
    }

    /// Re-fold raw Ctrl/Meta for the given platform
    pub fn canonicalize(self, platform: Platform) -> Self {
        Self {
            mods: self.mods.fold_primary(platform),
            key: self.key,
        }
    }

    /// Parse `mod+shift+k` style text for a specific platform
    pub fn parse(text: &str, platform: Platform) -> Result<Self, KeyParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyParseError::Empty);
        }

        // A trailing "++" means the key itself is '+'
        let (mod_part, key_part) = match text.strip_suffix("++") {
            Some(rest) => (rest, Some("+")),
            None if text == "+" => ("", Some("+")),
            None => (text, None),
        };

        let mut mods = Modifiers::NONE;
        let mut key = key_part.map(str::to_string);

        for part in mod_part.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(flag) = Modifiers::from_name(part, platform) {
                mods = mods | flag;
                continue;
            }
            if key.is_some() {
                return Err(KeyParseError::MultipleKeys(text.to_string()));
            }
            key = Some(part.to_string());
        }

        let key = key.ok_or_else(|| KeyParseError::MissingKey(text.to_string()))?;
        Hotkey::new(&key, mods.fold_primary(platform))
            .ok_or_else(|| KeyParseError::MissingKey(text.to_string()))
    }

    /// Display the hotkey for the given platform, e.g. `Mod + K` or `⌘ + K`
    pub fn display_for(&self, platform: Platform) -> String {
        let mut parts: Vec<&str> = self
            .mods
            .names()
            .map(|name| match (platform, name) {
                (Platform::Apple, "Mod") => "⌘",
                (Platform::Apple, "Alt") => "⌥",
                (Platform::Apple, "Shift") => "⇧",
                _ => name,
            })
            .collect();
        parts.push(&self.key);
        parts.join(" + ")
    }

    /// Display the hotkey using the current platform's symbols
    pub fn display_string(&self) -> String {
        self.display_for(Platform::current())
    }
}

impl FromStr for Hotkey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hotkey::parse(s, Platform::current())
    }
}

/// Text form round-trippable through [`FromStr`], e.g. `mod+shift+K`
impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.mods.to_string().to_lowercase(), self.key)
        }
    }
}

/// Persisted shape: `{ modifiers: ["Mod", "Shift"], key: "K" }`
#[derive(Serialize, Deserialize)]
struct HotkeyRepr {
    #[serde(default)]
    modifiers: Vec<String>,
    key: String,
}

impl TryFrom<HotkeyRepr> for Hotkey {
    type Error = KeyParseError;

    fn try_from(repr: HotkeyRepr) -> Result<Self, Self::Error> {
        let mut mods = Modifiers::NONE;
        for name in &repr.modifiers {
            // Raw names are kept as-is; folding happens once the platform is known
            let flag = match name.to_ascii_lowercase().as_str() {
                "mod" => Modifiers::MOD,
                "ctrl" | "control" => Modifiers::CTRL,
                "meta" | "cmd" | "super" | "win" => Modifiers::META,
                "alt" | "option" => Modifiers::ALT,
                "shift" => Modifiers::SHIFT,
                _ => return Err(KeyParseError::UnknownModifier(name.clone())),
            };
            mods = mods | flag;
        }
        Hotkey::new(&repr.key, mods).ok_or(KeyParseError::Empty)
    }
}

impl From<Hotkey> for HotkeyRepr {
    fn from(hotkey: Hotkey) -> Self {
        Self {
            modifiers: hotkey.mods.names().map(str::to_string).collect(),
            key: hotkey.key,
        }
    }
}

/// Errors from parsing hotkey text or persisted hotkeys
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty hotkey")]
    Empty,
    #[error("no key found in hotkey: {0}")]
    MissingKey(String),
    #[error("multiple keys in hotkey: {0}")]
    MultipleKeys(String),
    #[error("unknown modifier: {0}")]
    UnknownModifier(String),
}
