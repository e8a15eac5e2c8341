//! Windows backend: `SendInput` injection, GDI capture, and `EnumWindows`.
//!
//! Pointer moves use `SetCursorPos` (physical pixels relative to the primary
//! display's top-left), so no coordinate normalisation is needed.  Buttons,
//! keys, text, and the wheel all go through `SendInput`, which places events
//! in the same queue as hardware input.
//!
//! Text is sent as `KEYEVENTF_UNICODE` packets, one per UTF-16 code unit, so
//! typing does not depend on the active keyboard layout.

#![cfg(target_os = "windows")]

use std::mem::size_of;

use deskpilot_core::keymap::windows_vk;
use deskpilot_core::{Bounds, Frame, Key, MouseButton, Point, ScrollDelta, WindowDescriptor};
use tracing::debug;
use windows::core::{w, HSTRING, PWSTR};
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_HWHEEL,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL, MOUSE_EVENT_FLAGS,
    MOUSEINPUT, VIRTUAL_KEY,
};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetCursorPos, GetForegroundWindow, GetSystemMetrics, GetWindowRect,
    GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindowVisible,
    SetCursorPos, SetForegroundWindow, ShowWindow, SM_CXSCREEN, SM_CYSCREEN, SW_RESTORE,
    SW_SHOWNORMAL,
};

use crate::application::automate::{NativeBackend, NativeError};

/// One wheel "line" in `mouseData` units.
const WHEEL_DELTA: i32 = 120;

/// `SendInput`-backed [`NativeBackend`].
#[derive(Debug, Default)]
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

fn failed(what: &str, err: impl std::fmt::Display) -> NativeError {
    NativeError::Failed(format!("{what} failed: {err}"))
}

fn send(inputs: &[INPUT]) -> Result<(), NativeError> {
    // SAFETY: every INPUT is fully initialised and the size matches the type.
    let sent = unsafe { SendInput(inputs, size_of::<INPUT>() as i32) };
    if sent as usize == inputs.len() {
        Ok(())
    } else {
        Err(failed(
            "SendInput",
            format!(
                "{sent} of {} events injected: {}",
                inputs.len(),
                windows::core::Error::from_win32()
            ),
        ))
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS, data: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                // mouseData is a DWORD; negative wheel deltas wrap intentionally.
                mouseData: data as u32,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn button_flags(button: MouseButton, pressed: bool) -> MOUSE_EVENT_FLAGS {
    match (button, pressed) {
        (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
        (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

fn key_flags(key: Key, pressed: bool) -> KEYBD_EVENT_FLAGS {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if windows_vk::is_extended(key) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    flags
}

/// Wheel data for a line delta, saturating rather than wrapping.
fn wheel_data(delta: ScrollDelta) -> (i32, i32) {
    // Positive WHEEL data scrolls content up; positive HWHEEL scrolls right.
    (
        delta.dy.saturating_neg().saturating_mul(WHEEL_DELTA),
        delta.dx.saturating_mul(WHEEL_DELTA),
    )
}

fn wheel_inputs(delta: ScrollDelta) -> Vec<INPUT> {
    let (vertical, horizontal) = wheel_data(delta);
    let mut inputs = Vec::with_capacity(2);
    if vertical != 0 {
        inputs.push(mouse_input(MOUSEEVENTF_WHEEL, vertical));
    }
    if horizontal != 0 {
        inputs.push(mouse_input(MOUSEEVENTF_HWHEEL, horizontal));
    }
    inputs
}

/// A top-level window plus the handle needed to act on it.
struct Located {
    hwnd: HWND,
    window: WindowDescriptor,
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the address of the Vec passed by `enumerate`, which
    // outlives the EnumWindows call.
    let found = &mut *(lparam.0 as *mut Vec<Located>);

    if !IsWindowVisible(hwnd).as_bool() {
        return TRUE;
    }
    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return TRUE;
    }
    let mut buf = vec![0u16; len as usize + 1];
    let copied = GetWindowTextW(hwnd, &mut buf);
    let title = String::from_utf16_lossy(&buf[..copied.max(0) as usize]);

    let mut rect = RECT::default();
    let bounds = match GetWindowRect(hwnd, &mut rect) {
        Ok(()) => Bounds {
            x: rect.left,
            y: rect.top,
            width: (rect.right - rect.left).max(0) as u32,
            height: (rect.bottom - rect.top).max(0) as u32,
        },
        Err(_) => Bounds::default(),
    };

    found.push(Located {
        hwnd,
        window: WindowDescriptor {
            app: owning_app(hwnd).unwrap_or_default(),
            title,
            bounds,
            focused: hwnd == GetForegroundWindow(),
        },
    });
    TRUE
}

/// File stem of the executable that owns `hwnd`, e.g. `notepad`.
fn owning_app(hwnd: HWND) -> Option<String> {
    let mut pid = 0u32;
    // SAFETY: pid is a valid out-pointer for the duration of the call.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    if pid == 0 {
        return None;
    }
    // SAFETY: the handle is closed before returning on every path.
    unsafe {
        let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        let mut buf = [0u16; 1024];
        let mut len = buf.len() as u32;
        let queried = QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            PWSTR(buf.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(process);
        queried.ok()?;
        let path = String::from_utf16_lossy(&buf[..len as usize]);
        std::path::Path::new(&path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

fn enumerate() -> Result<Vec<Located>, NativeError> {
    let mut found: Vec<Located> = Vec::new();
    // SAFETY: the callback only dereferences lparam while `found` is alive.
    unsafe {
        EnumWindows(
            Some(collect_window),
            LPARAM(&mut found as *mut Vec<Located> as isize),
        )
    }
    .map_err(|e| failed("EnumWindows", e))?;
    Ok(found)
}

/// Exact app-name match wins over a title substring match.  A blank name
/// matches nothing.
fn find_app_window<'a>(windows: &'a [Located], name: &str) -> Option<&'a Located> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    windows
        .iter()
        .find(|w| w.window.app.to_lowercase() == needle)
        .or_else(|| {
            windows
                .iter()
                .find(|w| w.window.title.to_lowercase().contains(&needle))
        })
}

impl NativeBackend for WindowsBackend {
    fn capture_primary_display(&self) -> Result<Frame, NativeError> {
        // SAFETY: every GDI object created here is released before returning.
        unsafe {
            let width = GetSystemMetrics(SM_CXSCREEN);
            let height = GetSystemMetrics(SM_CYSCREEN);
            if width <= 0 || height <= 0 {
                return Err(NativeError::Failed(
                    "primary display reports no size".to_string(),
                ));
            }

            let screen = GetDC(HWND::default());
            let memory = CreateCompatibleDC(screen);
            let bitmap = CreateCompatibleBitmap(screen, width, height);
            let previous = SelectObject(memory, bitmap);

            let blit = BitBlt(memory, 0, 0, width, height, screen, 0, 0, SRCCOPY);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height requests a top-down DIB.
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let stride = width as usize * 4;
            let mut pixels = vec![0u8; stride * height as usize];
            let lines = if blit.is_ok() {
                GetDIBits(
                    memory,
                    bitmap,
                    0,
                    height as u32,
                    Some(pixels.as_mut_ptr().cast()),
                    &mut info,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(memory, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(memory);
            ReleaseDC(HWND::default(), screen);

            blit.map_err(|e| failed("BitBlt", e))?;
            if lines != height {
                return Err(NativeError::Failed(format!(
                    "GetDIBits copied {lines} of {height} lines"
                )));
            }
            Frame::from_bgra_rows(width as u32, height as u32, stride, &pixels)
                .map_err(|e| NativeError::Failed(e.to_string()))
        }
    }

    fn warp_pointer(&self, to: Point) -> Result<(), NativeError> {
        // SAFETY: SetCursorPos takes plain integers.
        unsafe { SetCursorPos(to.x, to.y) }.map_err(|e| failed("SetCursorPos", e))
    }

    fn pointer_position(&self) -> Result<Point, NativeError> {
        let mut point = POINT::default();
        // SAFETY: point is a valid out-pointer for the duration of the call.
        unsafe { GetCursorPos(&mut point) }.map_err(|e| failed("GetCursorPos", e))?;
        Ok(Point::new(point.x, point.y))
    }

    fn button(
        &self,
        button: MouseButton,
        pressed: bool,
        _click_index: u32,
    ) -> Result<(), NativeError> {
        // Windows derives double clicks from timing and position itself.
        send(&[mouse_input(button_flags(button, pressed), 0)])
    }

    fn key(&self, key: Key, pressed: bool) -> Result<(), NativeError> {
        send(&[keyboard_input(
            windows_vk::to_vk(key),
            0,
            key_flags(key, pressed),
        )])
    }

    fn type_char(&self, c: char) -> Result<(), NativeError> {
        let mut units = [0u16; 2];
        let mut inputs = Vec::with_capacity(4);
        for &unit in c.encode_utf16(&mut units).iter() {
            inputs.push(keyboard_input(0, unit, KEYEVENTF_UNICODE));
            inputs.push(keyboard_input(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
        }
        send(&inputs)
    }

    fn scroll(&self, delta: ScrollDelta) -> Result<(), NativeError> {
        let inputs = wheel_inputs(delta);
        if inputs.is_empty() {
            return Ok(());
        }
        send(&inputs)
    }

    fn activate_app(&self, name: &str) -> Result<(), NativeError> {
        if name.trim().is_empty() {
            return Err(NativeError::Failed("app name is empty".to_string()));
        }
        let windows = enumerate()?;
        let target = find_app_window(&windows, name)
            .ok_or_else(|| NativeError::Failed(format!("no window found for {name}")))?;
        debug!(app = %target.window.app, title = %target.window.title, "activating window");
        // SAFETY: hwnd came from EnumWindows during this call.
        unsafe {
            if IsIconic(target.hwnd).as_bool() {
                let _ = ShowWindow(target.hwnd, SW_RESTORE);
            }
            if !SetForegroundWindow(target.hwnd).as_bool() {
                return Err(NativeError::Failed(format!(
                    "SetForegroundWindow refused to focus {name}"
                )));
            }
        }
        Ok(())
    }

    fn launch_app(&self, name: &str) -> Result<(), NativeError> {
        let file = HSTRING::from(name);
        // SAFETY: all string arguments outlive the call.
        let result = unsafe {
            ShellExecuteW(
                HWND::default(),
                w!("open"),
                &file,
                None,
                None,
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 indicate success.
        let code = result.0 as isize;
        if code > 32 {
            Ok(())
        } else {
            Err(NativeError::Failed(format!(
                "ShellExecuteW could not open {name} (code {code})"
            )))
        }
    }

    fn list_windows(&self) -> Result<Vec<WindowDescriptor>, NativeError> {
        Ok(enumerate()?.into_iter().map(|l| l.window).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::ScrollDirection;

    fn located(app: &str, title: &str) -> Located {
        Located {
            hwnd: HWND::default(),
            window: WindowDescriptor::new(app, title),
        }
    }

    #[test]
    fn test_key_flags_marks_extended_and_release() {
        assert_eq!(key_flags(Key::KeyA, true), KEYBD_EVENT_FLAGS(0));
        assert_eq!(key_flags(Key::KeyA, false), KEYEVENTF_KEYUP);
        assert_eq!(
            key_flags(Key::ArrowUp, false),
            KEYEVENTF_EXTENDEDKEY | KEYEVENTF_KEYUP
        );
    }

    #[test]
    fn test_find_app_window_prefers_exact_app_name() {
        // Arrange
        let windows = vec![
            located("explorer", "notepad notes"),
            located("Notepad", "Untitled"),
        ];

        // Act
        let found = find_app_window(&windows, "notepad").unwrap();

        // Assert
        assert_eq!(found.window.title, "Untitled");
    }

    #[test]
    fn test_find_app_window_falls_back_to_title() {
        let windows = vec![located("chrome", "Inbox - Mail")];
        assert!(find_app_window(&windows, "mail").is_some());
        assert!(find_app_window(&windows, "slack").is_none());
    }

    #[test]
    fn test_find_app_window_rejects_blank_name() {
        // Arrange: a window whose owner lookup failed has an empty app name
        let windows = vec![located("", "Untitled"), located("chrome", "Inbox")];

        // Act / Assert
        assert!(find_app_window(&windows, "").is_none());
        assert!(find_app_window(&windows, "   ").is_none());
    }

    #[test]
    fn test_activate_app_with_blank_name_fails_before_enumerating() {
        let err = WindowsBackend::new().activate_app("").unwrap_err();
        assert_eq!(err, NativeError::Failed("app name is empty".to_string()));
    }

    #[test]
    fn test_wheel_data_saturates_instead_of_wrapping() {
        // Arrange
        let up = ScrollDirection::Up.delta(i32::MAX);
        let right = ScrollDirection::Right.delta(20_000_000);

        // Act
        let (vertical, _) = wheel_data(up);
        let (_, horizontal) = wheel_data(right);

        // Assert
        assert_eq!(vertical, i32::MAX);
        assert_eq!(horizontal, i32::MAX);
        assert_eq!(wheel_data(ScrollDirection::Down.delta(3)), (-360, 0));
    }
}
