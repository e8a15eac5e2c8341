//! macOS backend: CoreGraphics event injection, display capture, and the
//! window-server window list.
//!
//! # How input is injected
//!
//! Every primitive creates a `CGEventSource` in `HIDSystemState`, builds a
//! `CGEvent`, and posts it at `CGEventTapLocation::HID`, the same level as
//! physical keyboard and mouse input.  Applications cannot tell the
//! difference.
//!
//! CGEvent positions use global display coordinates: origin at the top-left
//! of the main display, Y increasing downward.  No flipping is needed.
//!
//! # Accessibility permission
//!
//! Posting at the HID tap requires the **Accessibility** permission
//! (System Settings → Privacy & Security → Accessibility).  Without it the
//! post silently does nothing, so construction logs a warning when the
//! process is not trusted.
//!
//! # Applications
//!
//! Activation and launch go through `osascript` and `open(1)`.  The app name
//! is passed as a separate argv item, never spliced into script text.

#![cfg(target_os = "macos")]

use std::process::Command;
use std::sync::Mutex;

use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::display::CGDisplay;
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTapLocation, CGEventType, CGMouseButton, EventField,
    ScrollEventUnit,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::{CGPoint, CGRect};
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowBounds, kCGWindowLayer,
    kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly, kCGWindowName,
    kCGWindowOwnerName,
};
use deskpilot_core::keymap::macos_cg;
use deskpilot_core::{Bounds, Frame, Key, MouseButton, Point, ScrollDelta, WindowDescriptor};
use tracing::{debug, warn};

use crate::application::automate::{NativeBackend, NativeError};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

/// CoreGraphics-backed [`NativeBackend`].
pub struct MacosBackend {
    /// Modifier flags currently held by `key`, applied to every key event.
    held: Mutex<CGEventFlags>,
}

impl MacosBackend {
    /// Verifies an HID event source can be created.
    ///
    /// # Errors
    ///
    /// `NativeError::Failed` if CoreGraphics refuses to create the source.
    pub fn new() -> Result<Self, NativeError> {
        event_source()?;
        // SAFETY: AXIsProcessTrusted takes no arguments and only reads state.
        if !unsafe { AXIsProcessTrusted() } {
            warn!("process is not trusted for Accessibility; injected input will be dropped");
        }
        Ok(Self {
            held: Mutex::new(CGEventFlags::CGEventFlagNull),
        })
    }

    fn held_flags(&self) -> CGEventFlags {
        *self.held.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_held_flags(&self, flags: CGEventFlags) {
        *self.held.lock().unwrap_or_else(|p| p.into_inner()) = flags;
    }
}

/// Modifier flags in effect after `key` goes down or up.  Non-modifier keys
/// leave `held` unchanged.
fn flags_after(held: CGEventFlags, key: Key, pressed: bool) -> CGEventFlags {
    let flag = match key {
        Key::ControlLeft => CGEventFlags::CGEventFlagControl,
        Key::ShiftLeft => CGEventFlags::CGEventFlagShift,
        Key::AltLeft => CGEventFlags::CGEventFlagAlternate,
        Key::MetaLeft => CGEventFlags::CGEventFlagCommand,
        _ => return held,
    };
    let mut next = held;
    if pressed {
        next.insert(flag);
    } else {
        next.remove(flag);
    }
    next
}

fn event_source() -> Result<CGEventSource, NativeError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|()| NativeError::Failed("CGEventSourceCreate failed".to_string()))
}

fn created(what: &str) -> impl FnOnce(()) -> NativeError + '_ {
    move |()| NativeError::Failed(format!("failed to create {what} event"))
}

fn current_location() -> Result<CGPoint, NativeError> {
    let event = CGEvent::new(event_source()?).map_err(created("null"))?;
    Ok(event.location())
}

fn mouse_event_types(button: MouseButton) -> (CGEventType, CGEventType, CGMouseButton) {
    match button {
        MouseButton::Left => (
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGMouseButton::Left,
        ),
        MouseButton::Right => (
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
            CGMouseButton::Right,
        ),
        MouseButton::Middle => (
            CGEventType::OtherMouseDown,
            CGEventType::OtherMouseUp,
            CGMouseButton::Center,
        ),
    }
}

fn run_tool(program: &str, args: &[&str]) -> Result<(), NativeError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| NativeError::Failed(format!("failed to run {program}: {e}")))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(NativeError::Failed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

impl NativeBackend for MacosBackend {
    fn capture_primary_display(&self) -> Result<Frame, NativeError> {
        let image = CGDisplay::main().image().ok_or_else(|| {
            NativeError::Failed(
                "CGDisplayCreateImage returned nothing (Screen Recording permission?)".to_string(),
            )
        })?;
        if image.bits_per_pixel() != 32 {
            return Err(NativeError::Failed(format!(
                "unexpected capture format: {} bits per pixel",
                image.bits_per_pixel()
            )));
        }
        let data = image.data();
        Frame::from_bgra_rows(
            image.width() as u32,
            image.height() as u32,
            image.bytes_per_row(),
            data.bytes(),
        )
        .map_err(|e| NativeError::Failed(e.to_string()))
    }

    fn warp_pointer(&self, to: Point) -> Result<(), NativeError> {
        let target = CGPoint::new(f64::from(to.x), f64::from(to.y));
        CGDisplay::warp_mouse_cursor_position(target)
            .map_err(|e| NativeError::Failed(format!("CGWarpMouseCursorPosition failed: {e}")))?;
        // A synthetic move lets hover-tracking apps notice the new position.
        let moved = CGEvent::new_mouse_event(
            event_source()?,
            CGEventType::MouseMoved,
            target,
            CGMouseButton::Left,
        )
        .map_err(created("mouse move"))?;
        moved.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn pointer_position(&self) -> Result<Point, NativeError> {
        let location = current_location()?;
        Ok(Point::new(
            location.x.round() as i32,
            location.y.round() as i32,
        ))
    }

    fn button(
        &self,
        button: MouseButton,
        pressed: bool,
        click_index: u32,
    ) -> Result<(), NativeError> {
        let (down, up, cg_button) = mouse_event_types(button);
        let event_type = if pressed { down } else { up };
        let event = CGEvent::new_mouse_event(
            event_source()?,
            event_type,
            current_location()?,
            cg_button,
        )
        .map_err(created("mouse button"))?;
        event.set_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE, i64::from(click_index));
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn key(&self, key: Key, pressed: bool) -> Result<(), NativeError> {
        let keycode = macos_cg::to_cgkeycode(key);
        let flags = flags_after(self.held_flags(), key, pressed);
        let event = CGEvent::new_keyboard_event(event_source()?, keycode, pressed)
            .map_err(created("keyboard"))?;
        event.set_flags(flags);
        event.post(CGEventTapLocation::HID);
        // Only a posted event changes what the system considers held.
        self.set_held_flags(flags);
        Ok(())
    }

    fn type_char(&self, c: char) -> Result<(), NativeError> {
        let mut buf = [0u8; 4];
        let text = c.encode_utf8(&mut buf);
        for pressed in [true, false] {
            // Keycode 0 carries no meaning once a Unicode string is attached.
            let event = CGEvent::new_keyboard_event(event_source()?, 0, pressed)
                .map_err(created("text"))?;
            event.set_flags(CGEventFlags::CGEventFlagNull);
            event.set_string(text);
            event.post(CGEventTapLocation::HID);
        }
        Ok(())
    }

    fn scroll(&self, delta: ScrollDelta) -> Result<(), NativeError> {
        // Positive wheel values scroll up/left on macOS.
        let event = CGEvent::new_scroll_event(
            event_source()?,
            ScrollEventUnit::LINE,
            2,
            -delta.dy,
            -delta.dx,
            0,
        )
        .map_err(created("scroll"))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn activate_app(&self, name: &str) -> Result<(), NativeError> {
        run_tool(
            "osascript",
            &[
                "-e",
                "on run argv",
                "-e",
                "tell application (item 1 of argv) to activate",
                "-e",
                "end run",
                name,
            ],
        )
    }

    fn launch_app(&self, name: &str) -> Result<(), NativeError> {
        run_tool("open", &["-a", name])
    }

    fn list_windows(&self) -> Result<Vec<WindowDescriptor>, NativeError> {
        let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
        let infos: CFArray = copy_window_info(options, kCGNullWindowID).ok_or_else(|| {
            NativeError::Failed("CGWindowListCopyWindowInfo returned nothing".to_string())
        })?;

        let mut windows = Vec::new();
        for item in infos.iter() {
            // SAFETY: every element of the window list is a CFDictionary, and
            // the array keeps it alive for the duration of this borrow.
            let info: CFDictionary<CFString, CFType> =
                unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) };

            // Layer 0 holds ordinary app windows; menus and overlays sit above.
            if number_field(&info, unsafe { kCGWindowLayer }) != Some(0) {
                continue;
            }
            let app = string_field(&info, unsafe { kCGWindowOwnerName }).unwrap_or_default();
            let title = string_field(&info, unsafe { kCGWindowName }).unwrap_or_default();
            if app.is_empty() && title.is_empty() {
                continue;
            }
            let bounds = bounds_field(&info, unsafe { kCGWindowBounds }).unwrap_or_default();

            windows.push(WindowDescriptor {
                app,
                title,
                bounds,
                // The list is ordered front to back.
                focused: windows.is_empty(),
            });
        }
        debug!(count = windows.len(), "enumerated on-screen windows");
        Ok(windows)
    }
}

fn field(info: &CFDictionary<CFString, CFType>, key: CFStringRef) -> Option<CFType> {
    // SAFETY: the kCGWindow* keys are immortal CFString constants.
    let key = unsafe { CFString::wrap_under_get_rule(key) };
    info.find(&key).map(|value| (*value).clone())
}

fn string_field(info: &CFDictionary<CFString, CFType>, key: CFStringRef) -> Option<String> {
    field(info, key)?
        .downcast::<CFString>()
        .map(|s| s.to_string())
}

fn number_field(info: &CFDictionary<CFString, CFType>, key: CFStringRef) -> Option<i64> {
    field(info, key)?.downcast::<CFNumber>()?.to_i64()
}

fn bounds_field(info: &CFDictionary<CFString, CFType>, key: CFStringRef) -> Option<Bounds> {
    let dict = field(info, key)?.downcast::<CFDictionary>()?;
    let rect = CGRect::from_dict_representation(&dict)?;
    Some(Bounds {
        x: rect.origin.x.round() as i32,
        y: rect.origin.y.round() as i32,
        width: rect.size.width.max(0.0).round() as u32,
        height: rect.size.height.max(0.0).round() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_button_uses_other_mouse_events() {
        let (down, up, button) = mouse_event_types(MouseButton::Middle);
        assert!(matches!(down, CGEventType::OtherMouseDown));
        assert!(matches!(up, CGEventType::OtherMouseUp));
        assert!(matches!(button, CGMouseButton::Center));
    }

    #[test]
    fn test_flags_after_tracks_modifier_press_and_release() {
        // Arrange
        let none = CGEventFlags::CGEventFlagNull;

        // Act
        let cmd = flags_after(none, Key::MetaLeft, true);
        let cmd_shift = flags_after(cmd, Key::ShiftLeft, true);
        let shift = flags_after(cmd_shift, Key::MetaLeft, false);

        // Assert
        assert!(cmd.contains(CGEventFlags::CGEventFlagCommand));
        assert!(cmd_shift.contains(CGEventFlags::CGEventFlagShift));
        assert!(!shift.contains(CGEventFlags::CGEventFlagCommand));
        assert!(shift.contains(CGEventFlags::CGEventFlagShift));
    }

    #[test]
    fn test_flags_after_ignores_ordinary_keys() {
        let held = CGEventFlags::CGEventFlagControl;
        assert_eq!(flags_after(held, Key::KeyS, true), held);
        assert_eq!(flags_after(held, Key::KeyS, false), held);
    }

    #[test]
    fn test_unposted_modifier_press_leaves_held_flags_untouched() {
        // Arrange: a press computes its flags but is never posted
        let backend = MacosBackend {
            held: Mutex::new(CGEventFlags::CGEventFlagNull),
        };
        let _pending = flags_after(backend.held_flags(), Key::MetaLeft, true);

        // Act: a later ordinary key computes from the stored state
        let later = flags_after(backend.held_flags(), Key::KeyA, true);

        // Assert
        assert!(!later.contains(CGEventFlags::CGEventFlagCommand));
    }

    #[test]
    fn test_run_tool_reports_nonzero_exit() {
        let err = run_tool("false", &[]).unwrap_err();
        assert!(matches!(err, NativeError::Failed(msg) if msg.contains("false exited")));
    }
}
