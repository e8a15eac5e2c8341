//! DriverSelector: resolves the platform driver once and caches it.
//!
//! # State machine
//!
//! ```text
//! Unresolved ──first call──▶ Resolving ──factory ok──▶ Resolved(driver)
//!      ▲                         │
//!      └──── transient error ────┤
//!                                └──unsupported OS──▶ Failed (terminal)
//! ```
//!
//! The state lives behind a `tokio::sync::Mutex`, so resolution completes
//! before any dependent call proceeds and two first calls cannot race.
//! `Resolved` is authoritative for the rest of the process; there is no way
//! to swap drivers.  `Failed` answers every later call with
//! `UnsupportedPlatform` without touching the OS.  A construction error other
//! than an unsupported platform (for example a missing event source) leaves
//! the selector unresolved so the next command retries.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deskpilot_core::{MouseButton, Point, ScrollDirection, WindowDescriptor};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::automate::DriverTimings;
use super::desktop::{Desktop, DesktopError};

/// Operating-system family the selector resolves a driver for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    MacOs,
    Windows,
    Other(String),
}

impl OsFamily {
    /// The family of the running process.
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value to a family.
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            other => OsFamily::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::MacOs => f.write_str("macos"),
            OsFamily::Windows => f.write_str("windows"),
            OsFamily::Other(name) => f.write_str(name),
        }
    }
}

/// Builds the driver for a family.
pub type DriverFactory =
    Box<dyn Fn(&OsFamily) -> Result<Arc<dyn Desktop>, DesktopError> + Send + Sync>;

enum SelectorState {
    Unresolved,
    /// Only observable if the factory panicked; treated like `Unresolved`.
    Resolving,
    Resolved(Arc<dyn Desktop>),
    Failed(DesktopError),
}

/// Lazily resolved, process-wide [`Desktop`].
pub struct DriverSelector {
    family: OsFamily,
    factory: DriverFactory,
    state: Mutex<SelectorState>,
}

impl DriverSelector {
    pub fn new(family: OsFamily, factory: DriverFactory) -> Self {
        Self {
            family,
            factory,
            state: Mutex::new(SelectorState::Unresolved),
        }
    }

    /// Selector for the running OS, backed by the native drivers.
    pub fn native(timings: DriverTimings) -> Self {
        Self::new(
            OsFamily::detect(),
            Box::new(move |family| crate::infrastructure::native::driver_for(family, timings)),
        )
    }

    pub fn family(&self) -> &OsFamily {
        &self.family
    }

    /// Returns the cached driver, resolving it on first use.
    pub async fn driver(&self) -> Result<Arc<dyn Desktop>, DesktopError> {
        let mut state = self.state.lock().await;
        match &*state {
            SelectorState::Resolved(driver) => return Ok(Arc::clone(driver)),
            SelectorState::Failed(err) => return Err(err.clone()),
            SelectorState::Unresolved | SelectorState::Resolving => {}
        }

        *state = SelectorState::Resolving;
        match (self.factory)(&self.family) {
            Ok(driver) => {
                info!(os = %self.family, "platform driver resolved");
                *state = SelectorState::Resolved(Arc::clone(&driver));
                Ok(driver)
            }
            Err(err @ DesktopError::UnsupportedPlatform(_)) => {
                error!(os = %self.family, "no platform driver for this OS");
                *state = SelectorState::Failed(err.clone());
                Err(err)
            }
            Err(err) => {
                warn!(os = %self.family, error = %err, "platform driver construction failed; will retry");
                *state = SelectorState::Unresolved;
                Err(err)
            }
        }
    }

    pub async fn is_resolved(&self) -> bool {
        matches!(*self.state.lock().await, SelectorState::Resolved(_))
    }
}

#[async_trait]
impl Desktop for DriverSelector {
    async fn capture_pixels(&self) -> Result<Vec<u8>, DesktopError> {
        self.driver().await?.capture_pixels().await
    }

    async fn pointer_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u32,
    ) -> Result<(), DesktopError> {
        self.driver().await?.pointer_click(at, button, clicks).await
    }

    async fn type_text(&self, text: &str) -> Result<(), DesktopError> {
        self.driver().await?.type_text(text).await
    }

    async fn key_chord(&self, key: &str, modifiers: &[String]) -> Result<(), DesktopError> {
        self.driver().await?.key_chord(key, modifiers).await
    }

    async fn scroll_by(
        &self,
        direction: ScrollDirection,
        amount: i32,
    ) -> Result<(), DesktopError> {
        self.driver().await?.scroll_by(direction, amount).await
    }

    async fn move_pointer(&self, to: Point) -> Result<(), DesktopError> {
        self.driver().await?.move_pointer(to).await
    }

    async fn pointer_position(&self) -> Result<Point, DesktopError> {
        self.driver().await?.pointer_position().await
    }

    async fn activate_app(&self, name: &str) -> Result<(), DesktopError> {
        self.driver().await?.activate_app(name).await
    }

    async fn launch_app(&self, name: &str) -> Result<(), DesktopError> {
        self.driver().await?.launch_app(name).await
    }

    async fn enumerate_windows(&self) -> Result<Vec<WindowDescriptor>, DesktopError> {
        self.driver().await?.enumerate_windows().await
    }

    async fn sleep(&self, ms: u64) -> Result<(), DesktopError> {
        self.driver().await?.sleep(ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::automate::AutomationDriver;
    use crate::infrastructure::native::mock::MockBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(
        calls: Arc<AtomicUsize>,
        outcome: fn() -> Result<(), DesktopError>,
    ) -> DriverFactory {
        Box::new(move |_family| {
            calls.fetch_add(1, Ordering::SeqCst);
            outcome()?;
            let driver: Arc<dyn Desktop> = Arc::new(AutomationDriver::new(
                MockBackend::new(),
                DriverTimings::immediate(),
            ));
            Ok(driver)
        })
    }

    #[test]
    fn test_os_family_from_os_name() {
        assert_eq!(OsFamily::from_os_name("macos"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_os_name("windows"), OsFamily::Windows);
        assert_eq!(
            OsFamily::from_os_name("linux"),
            OsFamily::Other("linux".to_string())
        );
    }

    #[tokio::test]
    async fn test_driver_is_resolved_once_and_reused() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let selector = DriverSelector::new(
            OsFamily::MacOs,
            counting_factory(Arc::clone(&calls), || Ok(())),
        );
        assert!(!selector.is_resolved().await);

        // Act
        selector.move_pointer(Point::new(1, 1)).await.unwrap();
        selector.pointer_position().await.unwrap();
        selector.enumerate_windows().await.unwrap();

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(selector.is_resolved().await);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let selector = DriverSelector::new(
            OsFamily::Other("plan9".to_string()),
            counting_factory(Arc::clone(&calls), || {
                Err(DesktopError::UnsupportedPlatform("plan9".to_string()))
            }),
        );

        let first = selector.capture_pixels().await.unwrap_err();
        let second = selector.type_text("hi").await.unwrap_err();
        let third = selector.enumerate_windows().await.unwrap_err();

        assert_eq!(first, DesktopError::UnsupportedPlatform("plan9".to_string()));
        assert_eq!(second, first);
        assert_eq!(third, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "factory must not be retried");
    }

    #[tokio::test]
    async fn test_transient_construction_error_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let selector = DriverSelector::new(
            OsFamily::Windows,
            counting_factory(Arc::clone(&calls), || {
                Err(DesktopError::Driver("event source unavailable".to_string()))
            }),
        );

        assert!(selector.pointer_position().await.is_err());
        assert!(selector.pointer_position().await.is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!selector.is_resolved().await);
    }

    #[tokio::test]
    async fn test_native_selector_on_unsupported_os_reports_unsupported() {
        let selector = DriverSelector::new(
            OsFamily::Other("haiku".to_string()),
            Box::new(move |family| {
                crate::infrastructure::native::driver_for(family, DriverTimings::immediate())
            }),
        );

        let err = selector.sleep(0).await.unwrap_err();

        assert_eq!(err, DesktopError::UnsupportedPlatform("haiku".to_string()));
    }
}
