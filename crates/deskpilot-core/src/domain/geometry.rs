//! Screen-space geometry: pointer positions and window rectangles.

use serde::{Deserialize, Serialize};

/// A position on the pixel grid of the virtual desktop.
///
/// Coordinates are already rounded to whole pixels; callers that receive
/// fractional values round them during command decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A window rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One entry of the `list_windows` result.
///
/// Platforms that cannot supply a rectangle or focus state leave those fields
/// at their defaults (all-zero bounds, not focused).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub app: String,
    pub title: String,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub focused: bool,
}

impl WindowDescriptor {
    /// A descriptor carrying only the owning app and window title.
    pub fn new(app: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            title: title.into(),
            bounds: Bounds::default(),
            focused: false,
        }
    }
}
