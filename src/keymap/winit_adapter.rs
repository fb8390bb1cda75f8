//! Adapter to convert winit key events to our Hotkey type

use winit::keyboard::{Key, ModifiersState, NamedKey};

use super::normalize::{normalize, RawKeyPress};
use super::types::{Hotkey, Platform};

/// Convert winit key event data to a [`RawKeyPress`]
///
/// Returns None if the key has no usable label (dead keys, unidentified keys).
pub fn raw_press_from_winit(logical_key: &Key, modifiers: ModifiersState) -> Option<RawKeyPress> {
    let key = match logical_key {
        Key::Character(s) => s.to_string(),
        Key::Named(NamedKey::Space) => " ".to_string(),
        Key::Named(named) => named_key_label(*named)?.to_string(),
        _ => return None,
    };

    Some(RawKeyPress {
        ctrl: modifiers.control_key(),
        meta: modifiers.super_key(),
        alt: modifiers.alt_key(),
        shift: modifiers.shift_key(),
        key,
    })
}

/// Convert a winit key press straight to a canonical hotkey
///
/// Bare modifier presses return None.
pub fn hotkey_from_winit(
    logical_key: &Key,
    modifiers: ModifiersState,
    platform: Platform,
) -> Option<Hotkey> {
    let press = raw_press_from_winit(logical_key, modifiers)?;
    normalize(&press, platform)
}

fn named_key_label(named: NamedKey) -> Option<&'static str> {
    let label = match named {
        // Modifiers map to their DOM names so the normalizer filters them
        NamedKey::Control => "Control",
        NamedKey::Shift => "Shift",
        NamedKey::Alt => "Alt",
        NamedKey::AltGraph => "AltGraph",
        NamedKey::Super | NamedKey::Meta => "Meta",
        NamedKey::Hyper => "Hyper",
        NamedKey::Fn => "Fn",
        NamedKey::CapsLock => "CapsLock",

        NamedKey::Enter => "Enter",
        NamedKey::Escape => "Escape",
        NamedKey::Tab => "Tab",
        NamedKey::Backspace => "Backspace",
        NamedKey::Delete => "Delete",

        // Arrows
        NamedKey::ArrowUp => "ArrowUp",
        NamedKey::ArrowDown => "ArrowDown",
        NamedKey::ArrowLeft => "ArrowLeft",
        NamedKey::ArrowRight => "ArrowRight",

        // Navigation
        NamedKey::Home => "Home",
        NamedKey::End => "End",
        NamedKey::PageUp => "PageUp",
        NamedKey::PageDown => "PageDown",
        NamedKey::Insert => "Insert",

        // Function keys
        NamedKey::F1 => "F1",
        NamedKey::F2 => "F2",
        NamedKey::F3 => "F3",
        NamedKey::F4 => "F4",
        NamedKey::F5 => "F5",
        NamedKey::F6 => "F6",
        NamedKey::F7 => "F7",
        NamedKey::F8 => "F8",
        NamedKey::F9 => "F9",
        NamedKey::F10 => "F10",
        NamedKey::F11 => "F11",
        NamedKey::F12 => "F12",

        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Modifiers;

    #[test]
    fn test_character_key() {
        let hotkey = hotkey_from_winit(
            &Key::Character("s".into()),
            ModifiersState::CONTROL,
            Platform::Other,
        );

        let hotkey = hotkey.expect("should map");
        assert_eq!(hotkey.label(), "S");
        assert_eq!(hotkey.mods, Modifiers::MOD);
    }

    #[test]
    fn test_space_becomes_space_label() {
        let hotkey = hotkey_from_winit(
            &Key::Named(NamedKey::Space),
            ModifiersState::SUPER,
            Platform::Apple,
        )
        .expect("should map");

        assert_eq!(hotkey.label(), "SPACE");
        assert_eq!(hotkey.mods, Modifiers::MOD);
    }

    #[test]
    fn test_shifted_character() {
        let hotkey = hotkey_from_winit(
            &Key::Character("?".into()),
            ModifiersState::SHIFT,
            Platform::Other,
        )
        .expect("should map");

        assert_eq!(hotkey.label(), "?");
        assert_eq!(hotkey.mods, Modifiers::SHIFT);
    }

    #[test]
    fn test_bare_modifier_is_ignored() {
        let hotkey = hotkey_from_winit(
            &Key::Named(NamedKey::Shift),
            ModifiersState::SHIFT,
            Platform::Other,
        );
        assert!(hotkey.is_none());
    }

    #[test]
    fn test_function_key() {
        let hotkey = hotkey_from_winit(
            &Key::Named(NamedKey::F5),
            ModifiersState::empty(),
            Platform::Other,
        )
        .expect("should map");
        assert_eq!(hotkey.label(), "F5");
    }
}
