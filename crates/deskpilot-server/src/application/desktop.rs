//! The Capability Interface: everything the dispatcher may ask of a desktop.
//!
//! [`Desktop`] is implemented once generically by
//! [`AutomationDriver`](super::automate::AutomationDriver) over a per-OS
//! native backend, and once by the
//! [`DriverSelector`](super::select_driver::DriverSelector), which resolves the
//! platform driver on first use and delegates to it.
//!
//! Every operation mutates OS-wide pointer, keyboard, or window state.  There
//! is no isolation and no undo.

use async_trait::async_trait;
use deskpilot_core::{MouseButton, Point, ScrollDirection, WindowDescriptor};
use thiserror::Error;

/// Failure of a capability operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesktopError {
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    /// A native call failed; carries the OS diagnostic text.
    #[error("{0}")]
    Driver(String),

    /// No driver exists for the detected operating-system family.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The resolved driver cannot perform this operation.
    #[error("{0} is not supported on this platform")]
    NotSupported(String),
}

/// Platform-agnostic desktop automation contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Desktop: Send + Sync {
    /// Full-resolution PNG of the primary display.
    async fn capture_pixels(&self) -> Result<Vec<u8>, DesktopError>;

    /// Warps to `at`, then issues `clicks` down/up pairs.
    async fn pointer_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u32,
    ) -> Result<(), DesktopError>;

    async fn type_text(&self, text: &str) -> Result<(), DesktopError>;

    /// Presses `modifiers` in order, taps `key`, releases `modifiers` in
    /// reverse.  Names are resolved case-insensitively.
    async fn key_chord(&self, key: &str, modifiers: &[String]) -> Result<(), DesktopError>;

    async fn scroll_by(&self, direction: ScrollDirection, amount: i32)
        -> Result<(), DesktopError>;

    async fn move_pointer(&self, to: Point) -> Result<(), DesktopError>;

    async fn pointer_position(&self) -> Result<Point, DesktopError>;

    async fn activate_app(&self, name: &str) -> Result<(), DesktopError>;

    async fn launch_app(&self, name: &str) -> Result<(), DesktopError>;

    /// Best-effort listing of top-level windows.
    ///
    /// Drivers never fail this because of a native error; they report an
    /// empty list instead.  The `Err` arm exists for the selector, which
    /// still reports `UnsupportedPlatform` here.
    async fn enumerate_windows(&self) -> Result<Vec<WindowDescriptor>, DesktopError>;

    async fn sleep(&self, ms: u64) -> Result<(), DesktopError>;
}
