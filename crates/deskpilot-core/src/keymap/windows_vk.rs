//! [`Key`] to Windows Virtual-Key (VK) code translation.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! VK codes are *logical* keys: `VK_A = 0x41` regardless of keyboard layout.
//! Letters and digits share their ASCII upper-case values, so those ranges
//! are computed from the HID usage ID instead of listed one by one.
//!
//! Every [`Key`] has a VK equivalent, so the lookup is total.

use super::Key;

/// Translates a [`Key`] to its Windows virtual-key code.
pub fn to_vk(key: Key) -> u16 {
    match key {
        Key::Enter => 0x0D,     // VK_RETURN
        Key::Escape => 0x1B,    // VK_ESCAPE
        Key::Backspace => 0x08, // VK_BACK
        Key::Tab => 0x09,       // VK_TAB
        Key::Space => 0x20,     // VK_SPACE

        Key::Insert => 0x2D,   // VK_INSERT
        Key::Delete => 0x2E,   // VK_DELETE
        Key::Home => 0x24,     // VK_HOME
        Key::End => 0x23,      // VK_END
        Key::PageUp => 0x21,   // VK_PRIOR
        Key::PageDown => 0x22, // VK_NEXT

        Key::ArrowLeft => 0x25,  // VK_LEFT
        Key::ArrowUp => 0x26,    // VK_UP
        Key::ArrowRight => 0x27, // VK_RIGHT
        Key::ArrowDown => 0x28,  // VK_DOWN

        Key::ControlLeft => 0xA2, // VK_LCONTROL
        Key::ShiftLeft => 0xA0,   // VK_LSHIFT
        Key::AltLeft => 0xA4,     // VK_LMENU
        Key::MetaLeft => 0x5B,    // VK_LWIN

        // HID puts `0` after `9`; VK follows ASCII.
        Key::Digit0 => 0x30,

        _ => ranged_vk(key.usage_id()),
    }
}

/// Letters, digits 1-9 and F1-F12 are contiguous in both code spaces.
fn ranged_vk(usage: u16) -> u16 {
    match usage {
        0x04..=0x1D => 0x41 + (usage - 0x04), // VK_A..VK_Z
        0x1E..=0x26 => 0x31 + (usage - 0x1E), // '1'..'9'
        _ => 0x70 + (usage - 0x3A),           // VK_F1..VK_F12
    }
}

/// Whether `SendInput` must flag this key with `KEYEVENTF_EXTENDEDKEY`.
///
/// The navigation cluster and the arrows live on the extended (E0-prefixed)
/// scan code page; without the flag they arrive as their numpad twins.
pub fn is_extended(key: Key) -> bool {
    matches!(
        key,
        Key::Insert
            | Key::Delete
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown
            | Key::ArrowLeft
            | Key::ArrowUp
            | Key::ArrowRight
            | Key::ArrowDown
            | Key::MetaLeft
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_map_to_ascii_uppercase() {
        assert_eq!(to_vk(Key::KeyA), 0x41);
        assert_eq!(to_vk(Key::KeyS), u16::from(b'S'));
        assert_eq!(to_vk(Key::KeyZ), 0x5A);
    }

    #[test]
    fn test_digits_map_to_ascii_digits() {
        assert_eq!(to_vk(Key::Digit0), 0x30);
        assert_eq!(to_vk(Key::Digit1), 0x31);
        assert_eq!(to_vk(Key::Digit9), 0x39);
    }

    #[test]
    fn test_function_keys_map_to_vk_f_range() {
        assert_eq!(to_vk(Key::F1), 0x70);
        assert_eq!(to_vk(Key::F12), 0x7B);
    }

    #[test]
    fn test_modifiers_map_to_left_hand_vks() {
        assert_eq!(to_vk(Key::ControlLeft), 0xA2);
        assert_eq!(to_vk(Key::ShiftLeft), 0xA0);
        assert_eq!(to_vk(Key::AltLeft), 0xA4);
        assert_eq!(to_vk(Key::MetaLeft), 0x5B);
    }

    #[test]
    fn test_navigation_keys_map_correctly() {
        assert_eq!(to_vk(Key::Enter), 0x0D);
        assert_eq!(to_vk(Key::PageDown), 0x22);
        assert_eq!(to_vk(Key::ArrowUp), 0x26);
    }

    #[test]
    fn test_arrows_are_extended_letters_are_not() {
        assert!(is_extended(Key::ArrowLeft));
        assert!(is_extended(Key::Delete));
        assert!(!is_extended(Key::KeyA));
        assert!(!is_extended(Key::Enter));
    }
}
