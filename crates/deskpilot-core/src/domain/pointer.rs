//! Mouse buttons and scroll directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A mouse button that `click` can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(format!("unknown mouse button: {other}")),
        }
    }
}

/// Direction argument of the `scroll` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }

    /// Converts a direction and magnitude into a signed line delta.
    ///
    /// Positive `dy` scrolls the content down (towards the end of a document),
    /// positive `dx` scrolls right.  Up and left negate.
    pub fn delta(self, amount: i32) -> ScrollDelta {
        match self {
            ScrollDirection::Up => ScrollDelta {
                dx: 0,
                dy: amount.saturating_neg(),
            },
            ScrollDirection::Down => ScrollDelta { dx: 0, dy: amount },
            ScrollDirection::Left => ScrollDelta {
                dx: amount.saturating_neg(),
                dy: 0,
            },
            ScrollDirection::Right => ScrollDelta { dx: amount, dy: 0 },
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrollDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(ScrollDirection::Up),
            "down" => Ok(ScrollDirection::Down),
            "left" => Ok(ScrollDirection::Left),
            "right" => Ok(ScrollDirection::Right),
            other => Err(format!("unknown scroll direction: {other}")),
        }
    }
}

/// A signed scroll amount in wheel lines, as handed to a native backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollDelta {
    pub dx: i32,
    pub dy: i32,
}
