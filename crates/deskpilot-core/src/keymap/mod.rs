//! Key vocabulary and per-platform key code tables.
//!
//! The canonical representation is [`Key`], whose discriminants are USB HID
//! usage IDs.  Platform drivers translate a `Key` to their native code at the
//! emulation boundary via [`windows_vk`] or [`macos_cg`].

pub mod key;
pub mod macos_cg;
pub mod windows_vk;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use key::Key;

/// A modifier that can be held while a `key_press` chord is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    /// Command on macOS, the Windows key on Windows.
    Meta,
}

impl Modifier {
    /// Resolves a modifier name case-insensitively.
    ///
    /// Accepts the platform spellings callers tend to use: `ctrl`/`control`,
    /// `alt`/`option`/`opt`, `shift`, and `meta`/`cmd`/`command`/`win`/`super`.
    pub fn from_name(name: &str) -> Option<Modifier> {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Control),
            "alt" | "option" | "opt" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" | "command" | "win" | "super" => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// The physical key pressed to hold this modifier.
    pub fn key(self) -> Key {
        match self {
            Modifier::Control => Key::ControlLeft,
            Modifier::Alt => Key::AltLeft,
            Modifier::Shift => Key::ShiftLeft,
            Modifier::Meta => Key::MetaLeft,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modifier::Control => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Meta => "meta",
        };
        f.write_str(name)
    }
}

/// Error returned when a modifier name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown modifier: {0}")]
pub struct UnknownModifier(pub String);

impl FromStr for Modifier {
    type Err = UnknownModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modifier::from_name(s).ok_or_else(|| UnknownModifier(s.to_string()))
    }
}
