//! Recording native backend for tests.
//!
//! # Why a mock backend?
//!
//! The real backends move the actual cursor, press real keys, and need a
//! logged-in desktop session.  `MockBackend` replaces every OS call with an
//! in-memory record so tests can assert exactly which native calls were made
//! and in what order.
//!
//! It also keeps a simulated pointer position, so a recorded button event
//! carries the position the pointer had at that moment.
//!
//! # Failure injection
//!
//! - [`failing`](MockBackend::failing) – every primitive fails.
//! - [`failing_window_list`](MockBackend::failing_window_list) – only
//!   `list_windows` fails.
//! - [`failing_key`](MockBackend::failing_key) – pressing one key fails.
//! - [`without_app_control`](MockBackend::without_app_control) – activation
//!   and launch report `NotSupported`.
//!
//! # Shared journal
//!
//! [`with_journal`](MockBackend::with_journal) makes every native call also
//! append a `native:<call>` line to a journal the test owns, so it can be
//! interleaved with other observations (for example, response writes).

use std::sync::{Arc, Mutex, MutexGuard};

use deskpilot_core::{Frame, Key, MouseButton, Point, ScrollDelta, WindowDescriptor};

use crate::application::automate::{NativeBackend, NativeError};

/// One recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Capture,
    Warp(Point),
    Button {
        button: MouseButton,
        pressed: bool,
        click_index: u32,
        /// Pointer position when the event was emitted.
        at: Point,
    },
    Key {
        key: Key,
        pressed: bool,
    },
    Char(char),
    Scroll(ScrollDelta),
    Activate(String),
    Launch(String),
    ListWindows,
}

/// A shared, ordered log of observations.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// A backend that records every call instead of touching the OS.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<NativeCall>>,
    position: Mutex<Point>,
    windows: Vec<WindowDescriptor>,
    frame: Option<Frame>,
    fail_all: bool,
    fail_list_windows: bool,
    fail_key: Option<Key>,
    no_app_control: bool,
    journal: Option<Journal>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(self, position: Point) -> Self {
        *lock(&self.position) = position;
        self
    }

    pub fn with_windows(mut self, windows: Vec<WindowDescriptor>) -> Self {
        self.windows = windows;
        self
    }

    /// Frame returned by captures; a 2x2 grey frame when unset.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn failing_window_list(mut self) -> Self {
        self.fail_list_windows = true;
        self
    }

    pub fn failing_key(mut self, key: Key) -> Self {
        self.fail_key = Some(key);
        self
    }

    pub fn without_app_control(mut self) -> Self {
        self.no_app_control = true;
        self
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<NativeCall> {
        lock(&self.calls).clone()
    }

    pub fn position(&self) -> Point {
        *lock(&self.position)
    }

    fn record(&self, call: NativeCall) -> Result<(), NativeError> {
        if self.fail_all {
            return Err(NativeError::Failed("injected failure".to_string()));
        }
        if let Some(journal) = &self.journal {
            lock(journal).push(format!("native:{call:?}"));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

/// Locks ignoring poisoning; a panicking test thread must not hide records.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NativeBackend for MockBackend {
    fn capture_primary_display(&self) -> Result<Frame, NativeError> {
        self.record(NativeCall::Capture)?;
        match &self.frame {
            Some(frame) => Ok(frame.clone()),
            None => Frame::new(2, 2, vec![0x80; 2 * 2 * 4])
                .map_err(|e| NativeError::Failed(e.to_string())),
        }
    }

    fn warp_pointer(&self, to: Point) -> Result<(), NativeError> {
        self.record(NativeCall::Warp(to))?;
        *lock(&self.position) = to;
        Ok(())
    }

    fn pointer_position(&self) -> Result<Point, NativeError> {
        if self.fail_all {
            return Err(NativeError::Failed("injected failure".to_string()));
        }
        Ok(self.position())
    }

    fn button(
        &self,
        button: MouseButton,
        pressed: bool,
        click_index: u32,
    ) -> Result<(), NativeError> {
        let at = self.position();
        self.record(NativeCall::Button {
            button,
            pressed,
            click_index,
            at,
        })
    }

    fn key(&self, key: Key, pressed: bool) -> Result<(), NativeError> {
        if pressed && self.fail_key == Some(key) {
            return Err(NativeError::Failed(format!("injected failure for {key:?}")));
        }
        self.record(NativeCall::Key { key, pressed })
    }

    fn type_char(&self, c: char) -> Result<(), NativeError> {
        self.record(NativeCall::Char(c))
    }

    fn scroll(&self, delta: ScrollDelta) -> Result<(), NativeError> {
        self.record(NativeCall::Scroll(delta))
    }

    fn activate_app(&self, name: &str) -> Result<(), NativeError> {
        if self.no_app_control {
            return Err(NativeError::NotSupported("activate_app"));
        }
        self.record(NativeCall::Activate(name.to_string()))
    }

    fn launch_app(&self, name: &str) -> Result<(), NativeError> {
        if self.no_app_control {
            return Err(NativeError::NotSupported("launch_app"));
        }
        self.record(NativeCall::Launch(name.to_string()))
    }

    fn list_windows(&self) -> Result<Vec<WindowDescriptor>, NativeError> {
        if self.fail_list_windows {
            return Err(NativeError::Failed("window server unavailable".to_string()));
        }
        self.record(NativeCall::ListWindows)?;
        Ok(self.windows.clone())
    }
}
