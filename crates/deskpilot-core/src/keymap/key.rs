//! Symbolic key vocabulary, keyed by USB HID usage IDs (page 0x07).
//!
//! Callers name keys with free-form strings such as `"Enter"`, `"pgdn"` or
//! `"s"`.  [`Key::from_name`] resolves them case-insensitively against a
//! fixed table of navigation, editing, and function keys; a single ASCII
//! letter or digit resolves structurally.  Anything else is unresolved: the
//! caller gets `None` rather than a silently substituted key.
//!
//! # Why HID usage IDs?
//!
//! HID usages describe *physical key positions*, which is what both
//! `SendInput` virtual keys and macOS `CGKeyCode`s ultimately address.  Using
//! them as discriminants keeps the per-platform tables in `windows_vk` and
//! `macos_cg` simple range and match lookups.

use serde::{Deserialize, Serialize};

use super::Modifier;

/// A key that can be pressed by `key_press`.
///
/// The numeric value of each variant is its HID usage ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Key {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27, `0` comes last)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Editing
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Modifiers (left-hand variants only)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
}

const LETTERS: [Key; 26] = [
    Key::KeyA,
    Key::KeyB,
    Key::KeyC,
    Key::KeyD,
    Key::KeyE,
    Key::KeyF,
    Key::KeyG,
    Key::KeyH,
    Key::KeyI,
    Key::KeyJ,
    Key::KeyK,
    Key::KeyL,
    Key::KeyM,
    Key::KeyN,
    Key::KeyO,
    Key::KeyP,
    Key::KeyQ,
    Key::KeyR,
    Key::KeyS,
    Key::KeyT,
    Key::KeyU,
    Key::KeyV,
    Key::KeyW,
    Key::KeyX,
    Key::KeyY,
    Key::KeyZ,
];

const DIGITS: [Key; 10] = [
    Key::Digit0,
    Key::Digit1,
    Key::Digit2,
    Key::Digit3,
    Key::Digit4,
    Key::Digit5,
    Key::Digit6,
    Key::Digit7,
    Key::Digit8,
    Key::Digit9,
];

/// Lower-case names (and aliases) of every non-alphanumeric key.
const NAMED_KEYS: &[(&str, Key)] = &[
    ("enter", Key::Enter),
    ("return", Key::Enter),
    ("tab", Key::Tab),
    ("space", Key::Space),
    ("backspace", Key::Backspace),
    ("delete", Key::Delete),
    ("del", Key::Delete),
    ("escape", Key::Escape),
    ("esc", Key::Escape),
    ("insert", Key::Insert),
    ("ins", Key::Insert),
    ("up", Key::ArrowUp),
    ("arrowup", Key::ArrowUp),
    ("down", Key::ArrowDown),
    ("arrowdown", Key::ArrowDown),
    ("left", Key::ArrowLeft),
    ("arrowleft", Key::ArrowLeft),
    ("right", Key::ArrowRight),
    ("arrowright", Key::ArrowRight),
    ("home", Key::Home),
    ("end", Key::End),
    ("pageup", Key::PageUp),
    ("pgup", Key::PageUp),
    ("pagedown", Key::PageDown),
    ("pgdn", Key::PageDown),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
];

impl Key {
    /// Resolves a caller-supplied key name.
    ///
    /// Lookup order: the named-key table, then modifier names (so `"shift"`
    /// can be pressed on its own), then a single ASCII letter or digit.
    pub fn from_name(name: &str) -> Option<Key> {
        let lower = name.to_ascii_lowercase();

        if let Some((_, key)) = NAMED_KEYS.iter().find(|(n, _)| *n == lower) {
            return Some(*key);
        }
        if let Some(modifier) = Modifier::from_name(&lower) {
            return Some(modifier.key());
        }

        let mut chars = lower.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::from_char(c),
            _ => None,
        }
    }

    /// Resolves a single ASCII letter (either case) or digit.
    pub fn from_char(c: char) -> Option<Key> {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() {
            LETTERS.get(usize::from(c as u8 - b'a')).copied()
        } else if c.is_ascii_digit() {
            DIGITS.get(usize::from(c as u8 - b'0')).copied()
        } else {
            None
        }
    }

    /// The HID usage ID of this key.
    pub fn usage_id(self) -> u16 {
        self as u16
    }

    /// `true` for the four modifier keys.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Key::ControlLeft | Key::ShiftLeft | Key::AltLeft | Key::MetaLeft
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Key::from_name("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_name("ENTER"), Some(Key::Enter));
        assert_eq!(Key::from_name("PageDown"), Some(Key::PageDown));
    }

    #[test]
    fn test_from_name_resolves_aliases() {
        assert_eq!(Key::from_name("return"), Some(Key::Enter));
        assert_eq!(Key::from_name("esc"), Some(Key::Escape));
        assert_eq!(Key::from_name("pgup"), Some(Key::PageUp));
        assert_eq!(Key::from_name("ArrowLeft"), Some(Key::ArrowLeft));
    }

    #[test]
    fn test_from_name_resolves_single_letters_structurally() {
        assert_eq!(Key::from_name("s"), Some(Key::KeyS));
        assert_eq!(Key::from_name("S"), Some(Key::KeyS));
        assert_eq!(Key::from_name("a"), Some(Key::KeyA));
        assert_eq!(Key::from_name("z"), Some(Key::KeyZ));
    }

    #[test]
    fn test_from_name_resolves_single_digits_structurally() {
        assert_eq!(Key::from_name("0"), Some(Key::Digit0));
        assert_eq!(Key::from_name("1"), Some(Key::Digit1));
        assert_eq!(Key::from_name("9"), Some(Key::Digit9));
    }

    #[test]
    fn test_from_name_resolves_function_keys() {
        assert_eq!(Key::from_name("f1"), Some(Key::F1));
        assert_eq!(Key::from_name("F12"), Some(Key::F12));
        assert_eq!(Key::from_name("F13"), None);
    }

    #[test]
    fn test_from_name_accepts_modifier_names_as_keys() {
        assert_eq!(Key::from_name("shift"), Some(Key::ShiftLeft));
        assert_eq!(Key::from_name("cmd"), Some(Key::MetaLeft));
    }

    #[test]
    fn test_from_name_rejects_unknown_names() {
        assert_eq!(Key::from_name("hyper"), None);
        assert_eq!(Key::from_name(""), None);
        assert_eq!(Key::from_name("!"), None);
        assert_eq!(Key::from_name("é"), None);
    }

    #[test]
    fn test_usage_ids_match_hid_page_7() {
        assert_eq!(Key::KeyA.usage_id(), 0x04);
        assert_eq!(Key::Digit0.usage_id(), 0x27);
        assert_eq!(Key::MetaLeft.usage_id(), 0xE3);
    }

    #[test]
    fn test_is_modifier() {
        assert!(Key::ControlLeft.is_modifier());
        assert!(!Key::KeyC.is_modifier());
    }
}
