//! [`Key`] to macOS `CGKeyCode` translation.
//!
//! CGKeyCode values are defined in Carbon Events.h (HIToolbox framework) as
//! `kVK_*` constants.  Unlike Windows VKs they follow the physical ANSI
//! layout, so there is no arithmetic shortcut; every key is listed.

use super::Key;

/// Translates a [`Key`] to a macOS `CGKeyCode` value.
pub fn to_cgkeycode(key: Key) -> u16 {
    match key {
        // Letters
        Key::KeyA => 0x00, // kVK_ANSI_A
        Key::KeyB => 0x0B,
        Key::KeyC => 0x08,
        Key::KeyD => 0x02,
        Key::KeyE => 0x0E,
        Key::KeyF => 0x03,
        Key::KeyG => 0x05,
        Key::KeyH => 0x04,
        Key::KeyI => 0x22,
        Key::KeyJ => 0x26,
        Key::KeyK => 0x28,
        Key::KeyL => 0x25,
        Key::KeyM => 0x2E,
        Key::KeyN => 0x2D,
        Key::KeyO => 0x1F,
        Key::KeyP => 0x23,
        Key::KeyQ => 0x0C,
        Key::KeyR => 0x0F,
        Key::KeyS => 0x01,
        Key::KeyT => 0x11,
        Key::KeyU => 0x20,
        Key::KeyV => 0x09,
        Key::KeyW => 0x0D,
        Key::KeyX => 0x07,
        Key::KeyY => 0x10,
        Key::KeyZ => 0x06,

        // Digits
        Key::Digit0 => 0x1D, // kVK_ANSI_0
        Key::Digit1 => 0x12,
        Key::Digit2 => 0x13,
        Key::Digit3 => 0x14,
        Key::Digit4 => 0x15,
        Key::Digit5 => 0x17,
        Key::Digit6 => 0x16,
        Key::Digit7 => 0x1A,
        Key::Digit8 => 0x1C,
        Key::Digit9 => 0x19,

        Key::Enter => 0x24,     // kVK_Return
        Key::Escape => 0x35,    // kVK_Escape
        Key::Backspace => 0x33, // kVK_Delete
        Key::Tab => 0x30,       // kVK_Tab
        Key::Space => 0x31,     // kVK_Space

        Key::Insert => 0x72,   // kVK_Help, sits where Insert is on PC keyboards
        Key::Home => 0x73,     // kVK_Home
        Key::PageUp => 0x74,   // kVK_PageUp
        Key::Delete => 0x75,   // kVK_ForwardDelete
        Key::End => 0x77,      // kVK_End
        Key::PageDown => 0x79, // kVK_PageDown

        Key::ArrowLeft => 0x7B,  // kVK_LeftArrow
        Key::ArrowRight => 0x7C, // kVK_RightArrow
        Key::ArrowDown => 0x7D,  // kVK_DownArrow
        Key::ArrowUp => 0x7E,    // kVK_UpArrow

        Key::F1 => 0x7A,
        Key::F2 => 0x78,
        Key::F3 => 0x63,
        Key::F4 => 0x76,
        Key::F5 => 0x60,
        Key::F6 => 0x61,
        Key::F7 => 0x62,
        Key::F8 => 0x64,
        Key::F9 => 0x65,
        Key::F10 => 0x6D,
        Key::F11 => 0x67,
        Key::F12 => 0x6F,

        Key::ControlLeft => 0x3B, // kVK_Control
        Key::ShiftLeft => 0x38,   // kVK_Shift
        Key::AltLeft => 0x3A,     // kVK_Option
        Key::MetaLeft => 0x37,    // kVK_Command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_a_maps_to_zero() {
        // kVK_ANSI_A = 0x00
        assert_eq!(to_cgkeycode(Key::KeyA), 0x00);
    }

    #[test]
    fn test_command_s_uses_ansi_positions() {
        assert_eq!(to_cgkeycode(Key::MetaLeft), 0x37);
        assert_eq!(to_cgkeycode(Key::KeyS), 0x01);
    }

    #[test]
    fn test_arrow_keys_have_correct_cgkeycodes() {
        assert_eq!(to_cgkeycode(Key::ArrowLeft), 0x7B);
        assert_eq!(to_cgkeycode(Key::ArrowRight), 0x7C);
        assert_eq!(to_cgkeycode(Key::ArrowDown), 0x7D);
        assert_eq!(to_cgkeycode(Key::ArrowUp), 0x7E);
    }

    #[test]
    fn test_letters_have_distinct_codes() {
        let mut codes: Vec<u16> = ('a'..='z')
            .filter_map(Key::from_char)
            .map(to_cgkeycode)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 26);
    }
}
