//! AutomationDriver: the platform-independent half of every platform driver.
//!
//! Each supported OS provides a [`NativeBackend`] in the infrastructure layer:
//! a thin, synchronous wrapper around the OS input-injection, capture, and
//! window APIs.  `AutomationDriver` layers the shared rules on top of it and
//! implements [`Desktop`]:
//!
//! - **Click** – always warps to the target first, waits for the pointer to
//!   settle, then issues `clicks` down/up pairs separated by
//!   `click_interval`.  The prior pointer position is never relied on.
//! - **Key chord** – key and modifier names are resolved before any native
//!   call.  Modifiers go down in caller order and come up in exactly the
//!   reverse order, including when a press fails partway.
//! - **Scroll** – up/left negate relative to down/right; magnitude is the
//!   requested amount in wheel lines.
//! - **Window enumeration** – native failures are logged and reported as an
//!   empty list.
//! - **Capture** – the raw frame is PNG-encoded before it leaves the driver.
//!
//! # Why `spawn_blocking`?
//!
//! Native calls block the calling thread (and `SendInput`/`CGEventPost` may
//! stall while the OS is busy).  Running them on tokio's blocking pool keeps
//! the session task free to observe the shutdown signal while a call is
//! outstanding.  A panic inside a native call surfaces as a driver error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskpilot_core::{
    Frame, Key, Modifier, MouseButton, Point, ScrollDelta, ScrollDirection, WindowDescriptor,
};
use thiserror::Error;
use tracing::{debug, warn};

use super::desktop::{Desktop, DesktopError};

/// Error returned by a [`NativeBackend`] primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    #[error("{0}")]
    Failed(String),
    #[error("{0} is not supported on this platform")]
    NotSupported(&'static str),
}

impl From<NativeError> for DesktopError {
    fn from(err: NativeError) -> Self {
        match err {
            NativeError::Failed(msg) => DesktopError::Driver(msg),
            NativeError::NotSupported(op) => DesktopError::NotSupported(op.to_string()),
        }
    }
}

/// OS-level primitives one platform driver must supply.
///
/// All methods block.  Implementations must be callable from any thread.
pub trait NativeBackend: Send + Sync + 'static {
    /// Grabs one complete frame of the primary display.
    fn capture_primary_display(&self) -> Result<Frame, NativeError>;

    /// Moves the pointer to an absolute position.
    fn warp_pointer(&self, to: Point) -> Result<(), NativeError>;

    fn pointer_position(&self) -> Result<Point, NativeError>;

    /// Presses or releases `button` at the current pointer position.
    ///
    /// `click_index` is the 1-based position of this press within a
    /// multi-click sequence, so backends that track click state can report a
    /// double click as such.
    fn button(&self, button: MouseButton, pressed: bool, click_index: u32)
        -> Result<(), NativeError>;

    /// Presses or releases one physical key.
    fn key(&self, key: Key, pressed: bool) -> Result<(), NativeError>;

    /// Injects one character of text, independent of keyboard layout.
    fn type_char(&self, c: char) -> Result<(), NativeError>;

    /// Scrolls by a signed number of wheel lines.
    fn scroll(&self, delta: ScrollDelta) -> Result<(), NativeError>;

    fn activate_app(&self, name: &str) -> Result<(), NativeError>;

    fn launch_app(&self, name: &str) -> Result<(), NativeError>;

    fn list_windows(&self) -> Result<Vec<WindowDescriptor>, NativeError>;
}

/// Delays the driver inserts between native calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimings {
    /// Pause between the warp and the first button press of a click.
    pub pointer_settle: Duration,
    /// Pause between consecutive clicks of a multi-click.
    pub click_interval: Duration,
    /// Pause between characters of `type_text`.
    pub keystroke_interval: Duration,
}

impl Default for DriverTimings {
    fn default() -> Self {
        Self {
            pointer_settle: Duration::from_millis(10),
            click_interval: Duration::from_millis(10),
            keystroke_interval: Duration::ZERO,
        }
    }
}

impl DriverTimings {
    /// No delays at all; for tests.
    pub fn immediate() -> Self {
        Self {
            pointer_settle: Duration::ZERO,
            click_interval: Duration::ZERO,
            keystroke_interval: Duration::ZERO,
        }
    }
}

/// [`Desktop`] implementation over one [`NativeBackend`].
pub struct AutomationDriver<B> {
    backend: Arc<B>,
    timings: DriverTimings,
}

impl<B: NativeBackend> AutomationDriver<B> {
    pub fn new(backend: B, timings: DriverTimings) -> Self {
        Self::from_shared(Arc::new(backend), timings)
    }

    /// Builds a driver over a backend the caller keeps a handle to.
    pub fn from_shared(backend: Arc<B>, timings: DriverTimings) -> Self {
        Self { backend, timings }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timings(&self) -> DriverTimings {
        self.timings
    }

    /// Runs `f` against the backend on the blocking pool.
    async fn blocking<T, F>(&self, op: &'static str, f: F) -> Result<T, DesktopError>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T, NativeError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        match tokio::task::spawn_blocking(move || f(backend.as_ref())).await {
            Ok(result) => result.map_err(DesktopError::from),
            Err(join_err) => Err(DesktopError::Driver(format!("{op} aborted: {join_err}"))),
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn resolve_chord(key: &str, modifiers: &[String]) -> Result<(Key, Vec<Key>), DesktopError> {
    let key = Key::from_name(key).ok_or_else(|| DesktopError::UnknownKey(key.to_string()))?;
    let modifiers = modifiers
        .iter()
        .map(|name| {
            Modifier::from_name(name)
                .map(Modifier::key)
                .ok_or_else(|| DesktopError::UnknownModifier(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((key, modifiers))
}

/// Emits the chord, releasing every modifier that went down even if a later
/// press fails.  The first error wins.
fn emit_chord<B: NativeBackend>(backend: &B, key: Key, modifiers: &[Key]) -> Result<(), NativeError> {
    let mut held = Vec::with_capacity(modifiers.len());
    let mut result = Ok(());

    for &modifier in modifiers {
        if let Err(e) = backend.key(modifier, true) {
            result = Err(e);
            break;
        }
        held.push(modifier);
    }

    if result.is_ok() {
        result = backend
            .key(key, true)
            .and_then(|()| backend.key(key, false));
    }

    for &modifier in held.iter().rev() {
        let released = backend.key(modifier, false);
        if result.is_ok() {
            result = released;
        }
    }
    result
}

#[async_trait]
impl<B: NativeBackend> Desktop for AutomationDriver<B> {
    async fn capture_pixels(&self) -> Result<Vec<u8>, DesktopError> {
        let png = self
            .blocking("capture", |b| {
                let frame = b.capture_primary_display()?;
                frame
                    .encode_png()
                    .map_err(|e| NativeError::Failed(e.to_string()))
            })
            .await?;
        debug!(bytes = png.len(), "captured primary display");
        Ok(png)
    }

    async fn pointer_click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u32,
    ) -> Result<(), DesktopError> {
        let clicks = clicks.max(1);
        self.blocking("warp", move |b| b.warp_pointer(at)).await?;
        pause(self.timings.pointer_settle).await;

        for index in 1..=clicks {
            self.blocking("click", move |b| {
                b.button(button, true, index)?;
                b.button(button, false, index)
            })
            .await?;
            if index < clicks {
                pause(self.timings.click_interval).await;
            }
        }
        debug!(x = at.x, y = at.y, %button, clicks, "clicked");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), DesktopError> {
        let text = text.to_owned();
        let interval = self.timings.keystroke_interval;
        self.blocking("type", move |b| {
            for (i, c) in text.chars().enumerate() {
                if i > 0 && !interval.is_zero() {
                    std::thread::sleep(interval);
                }
                b.type_char(c)?;
            }
            Ok(())
        })
        .await
    }

    async fn key_chord(&self, key: &str, modifiers: &[String]) -> Result<(), DesktopError> {
        let (key, modifiers) = resolve_chord(key, modifiers)?;
        debug!(?key, ?modifiers, "key chord");
        self.blocking("key chord", move |b| emit_chord(b, key, &modifiers))
            .await
    }

    async fn scroll_by(
        &self,
        direction: ScrollDirection,
        amount: i32,
    ) -> Result<(), DesktopError> {
        let delta = direction.delta(amount);
        self.blocking("scroll", move |b| b.scroll(delta)).await
    }

    async fn move_pointer(&self, to: Point) -> Result<(), DesktopError> {
        self.blocking("warp", move |b| b.warp_pointer(to)).await
    }

    async fn pointer_position(&self) -> Result<Point, DesktopError> {
        self.blocking("pointer position", |b| b.pointer_position())
            .await
    }

    async fn activate_app(&self, name: &str) -> Result<(), DesktopError> {
        let name = name.to_owned();
        self.blocking("activate", move |b| b.activate_app(&name))
            .await
    }

    async fn launch_app(&self, name: &str) -> Result<(), DesktopError> {
        let name = name.to_owned();
        self.blocking("launch", move |b| b.launch_app(&name)).await
    }

    async fn enumerate_windows(&self) -> Result<Vec<WindowDescriptor>, DesktopError> {
        match self.blocking("list windows", |b| b.list_windows()).await {
            Ok(windows) => Ok(windows),
            Err(e) => {
                warn!(error = %e, "window enumeration failed; reporting no windows");
                Ok(Vec::new())
            }
        }
    }

    async fn sleep(&self, ms: u64) -> Result<(), DesktopError> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::native::mock::{MockBackend, NativeCall};

    fn driver(backend: MockBackend) -> AutomationDriver<MockBackend> {
        AutomationDriver::new(backend, DriverTimings::immediate())
    }

    #[tokio::test]
    async fn test_click_warps_before_first_button_down() {
        // Arrange: pointer starts somewhere else
        let d = driver(MockBackend::new().with_position(Point::new(5, 5)));

        // Act
        d.pointer_click(Point::new(100, 200), MouseButton::Left, 1)
            .await
            .unwrap();

        // Assert
        let calls = d.backend().calls();
        assert_eq!(calls[0], NativeCall::Warp(Point::new(100, 200)));
        assert_eq!(
            calls[1],
            NativeCall::Button {
                button: MouseButton::Left,
                pressed: true,
                click_index: 1,
                at: Point::new(100, 200),
            }
        );
    }

    #[tokio::test]
    async fn test_double_click_issues_two_down_up_pairs() {
        let d = driver(MockBackend::new());

        d.pointer_click(Point::new(1, 2), MouseButton::Right, 2)
            .await
            .unwrap();

        let buttons: Vec<(bool, u32)> = d
            .backend()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NativeCall::Button {
                    pressed,
                    click_index,
                    ..
                } => Some((pressed, click_index)),
                _ => None,
            })
            .collect();
        assert_eq!(buttons, vec![(true, 1), (false, 1), (true, 2), (false, 2)]);
    }

    #[tokio::test]
    async fn test_click_count_zero_still_clicks_once() {
        let d = driver(MockBackend::new());

        d.pointer_click(Point::new(0, 0), MouseButton::Left, 0)
            .await
            .unwrap();

        let downs = d
            .backend()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, NativeCall::Button { pressed: true, .. }))
            .count();
        assert_eq!(downs, 1);
    }

    #[tokio::test]
    async fn test_chord_presses_in_order_and_releases_in_reverse() {
        // Arrange
        let d = driver(MockBackend::new());
        let modifiers = vec!["cmd".to_string()];

        // Act
        d.key_chord("s", &modifiers).await.unwrap();

        // Assert
        assert_eq!(
            d.backend().calls(),
            vec![
                NativeCall::Key { key: Key::MetaLeft, pressed: true },
                NativeCall::Key { key: Key::KeyS, pressed: true },
                NativeCall::Key { key: Key::KeyS, pressed: false },
                NativeCall::Key { key: Key::MetaLeft, pressed: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_chord_with_two_modifiers_mirrors_release_order() {
        let d = driver(MockBackend::new());
        let modifiers = vec!["ctrl".to_string(), "Shift".to_string()];

        d.key_chord("Tab", &modifiers).await.unwrap();

        let keys: Vec<(Key, bool)> = d
            .backend()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NativeCall::Key { key, pressed } => Some((key, pressed)),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                (Key::ControlLeft, true),
                (Key::ShiftLeft, true),
                (Key::Tab, true),
                (Key::Tab, false),
                (Key::ShiftLeft, false),
                (Key::ControlLeft, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_key_fails_before_any_native_call() {
        let d = driver(MockBackend::new());

        let err = d.key_chord("hyper", &[]).await.unwrap_err();

        assert_eq!(err, DesktopError::UnknownKey("hyper".to_string()));
        assert!(d.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_modifier_fails_before_any_native_call() {
        let d = driver(MockBackend::new());
        let modifiers = vec!["ctrl".to_string(), "hyper".to_string()];

        let err = d.key_chord("a", &modifiers).await.unwrap_err();

        assert_eq!(err, DesktopError::UnknownModifier("hyper".to_string()));
        assert!(d.backend().calls().is_empty());
    }

    #[test]
    fn test_failed_key_press_still_releases_held_modifiers() {
        // Arrange: the target key fails, modifiers are already down
        let backend = MockBackend::new().failing_key(Key::KeyS);

        // Act
        let result = emit_chord(&backend, Key::KeyS, &[Key::ControlLeft, Key::AltLeft]);

        // Assert
        assert!(result.is_err());
        assert_eq!(
            backend.calls(),
            vec![
                NativeCall::Key { key: Key::ControlLeft, pressed: true },
                NativeCall::Key { key: Key::AltLeft, pressed: true },
                NativeCall::Key { key: Key::AltLeft, pressed: false },
                NativeCall::Key { key: Key::ControlLeft, pressed: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_scroll_up_is_negative_down_is_positive() {
        let d = driver(MockBackend::new());

        d.scroll_by(ScrollDirection::Up, 5).await.unwrap();
        d.scroll_by(ScrollDirection::Down, 5).await.unwrap();

        assert_eq!(
            d.backend().calls(),
            vec![
                NativeCall::Scroll(ScrollDelta { dx: 0, dy: -5 }),
                NativeCall::Scroll(ScrollDelta { dx: 0, dy: 5 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_type_text_injects_each_character_in_order() {
        let d = driver(MockBackend::new());

        d.type_text("hé!").await.unwrap();

        assert_eq!(
            d.backend().calls(),
            vec![
                NativeCall::Char('h'),
                NativeCall::Char('é'),
                NativeCall::Char('!'),
            ]
        );
    }

    #[tokio::test]
    async fn test_enumeration_failure_yields_empty_list() {
        let d = driver(
            MockBackend::new()
                .with_windows(vec![WindowDescriptor::new("Finder", "Desktop")])
                .failing_window_list(),
        );

        let windows = d.enumerate_windows().await.unwrap();

        assert!(windows.is_empty());
    }

    #[tokio::test]
    async fn test_enumeration_returns_backend_windows() {
        let d = driver(MockBackend::new().with_windows(vec![WindowDescriptor::new("Code", "x")]));

        let windows = d.enumerate_windows().await.unwrap();

        assert_eq!(windows, vec![WindowDescriptor::new("Code", "x")]);
    }

    #[tokio::test]
    async fn test_native_failure_propagates_as_driver_error() {
        let d = driver(MockBackend::new().failing());

        let err = d.move_pointer(Point::new(1, 1)).await.unwrap_err();

        assert!(matches!(err, DesktopError::Driver(_)));
    }

    #[tokio::test]
    async fn test_not_supported_maps_to_not_supported() {
        let d = driver(MockBackend::new().without_app_control());

        let err = d.launch_app("Safari").await.unwrap_err();

        assert_eq!(err, DesktopError::NotSupported("launch_app".to_string()));
    }

    #[tokio::test]
    async fn test_capture_returns_png_bytes() {
        let d = driver(MockBackend::new());

        let png = d.capture_pixels().await.unwrap();

        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_move_then_position_round_trips() {
        let d = driver(MockBackend::new());

        d.move_pointer(Point::new(42, 24)).await.unwrap();

        assert_eq!(d.pointer_position().await.unwrap(), Point::new(42, 24));
    }

    #[tokio::test]
    async fn test_sleep_waits_requested_duration() {
        let d = driver(MockBackend::new());
        let start = tokio::time::Instant::now();

        d.sleep(20).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(d.backend().calls().is_empty());
    }
}
