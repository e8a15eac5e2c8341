//! Per-OS [`NativeBackend`](crate::application::automate::NativeBackend)
//! implementations.
//!
//! The real backends are selected at compile time via `#[cfg(target_os)]`;
//! [`driver_for`] maps the detected OS family to one of them.  The recording
//! [`mock::MockBackend`] is always compiled so integration tests can drive the
//! full stack on any host.

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::Arc;

#[cfg(any(target_os = "macos", target_os = "windows"))]
use crate::application::automate::AutomationDriver;
use crate::application::automate::DriverTimings;
use crate::application::desktop::{Desktop, DesktopError};
use crate::application::select_driver::OsFamily;

/// Builds the platform driver for `family`.
///
/// # Errors
///
/// `UnsupportedPlatform` when this build has no backend for `family`;
/// `Driver` when the backend exists but could not be initialised.
#[cfg_attr(
    not(any(target_os = "macos", target_os = "windows")),
    allow(unused_variables)
)]
pub fn driver_for(
    family: &OsFamily,
    timings: DriverTimings,
) -> Result<Arc<dyn Desktop>, DesktopError> {
    match family {
        #[cfg(target_os = "macos")]
        OsFamily::MacOs => {
            let backend = macos::MacosBackend::new()?;
            Ok(Arc::new(AutomationDriver::new(backend, timings)))
        }
        #[cfg(target_os = "windows")]
        OsFamily::Windows => Ok(Arc::new(AutomationDriver::new(
            windows::WindowsBackend::new(),
            timings,
        ))),
        other => Err(DesktopError::UnsupportedPlatform(other.to_string())),
    }
}
