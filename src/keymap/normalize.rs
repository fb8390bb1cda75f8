//! Raw key press → canonical [`Hotkey`]
//!
//! The normalizer is a pure function of the press and the platform. Bare
//! modifier presses produce `None`; the caller ignores them and keeps
//! waiting for a real key.

use super::types::{Hotkey, Modifiers, Platform};

/// Key names that only ever mean "a modifier went down"
const MODIFIER_ONLY_KEYS: &[&str] = &[
    "Control", "Shift", "Alt", "AltGraph", "Meta", "Super", "Hyper", "OS", "Fn", "CapsLock",
];

/// A key press as reported by the host, before canonicalisation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawKeyPress {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    /// The logical key: a printable character (`"k"`, `" "`, `"?"`) or a key name (`"Enter"`)
    pub key: String,
}

impl RawKeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// True when the press carries no primary key
    pub fn is_modifier_only(&self) -> bool {
        self.key.is_empty() || MODIFIER_ONLY_KEYS.contains(&self.key.as_str())
    }

    fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::NONE;
        if self.ctrl {
            mods = mods | Modifiers::CTRL;
        }
        if self.meta {
            mods = mods | Modifiers::META;
        }
        if self.alt {
            mods = mods | Modifiers::ALT;
        }
        if self.shift {
            mods = mods | Modifiers::SHIFT;
        }
        mods
    }
}

/// Convert a raw press into a canonical hotkey for `platform`
pub fn normalize(press: &RawKeyPress, platform: Platform) -> Option<Hotkey> {
    if press.is_modifier_only() {
        return None;
    }
    Hotkey::new(&press.key, press.modifiers().fold_primary(platform))
}
