//! Typed commands decoded from a name and an untyped argument map.
//!
//! Decoding is deliberately forgiving: numbers may arrive as JSON numbers or
//! numeric strings, string arguments accept numbers and booleans, a list
//! argument accepts a bare string, and enumerated choices ignore case.
//! Missing optional arguments take the default declared in the registry.
//! Key and modifier *names* are left as strings; the driver resolves them so
//! that an unknown key is reported as such rather than as a decode failure.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use super::registry::CommandDescriptor;
use crate::domain::geometry::Point;
use crate::domain::pointer::{MouseButton, ScrollDirection};

/// Largest scroll magnitude, in wheel lines, a single command may request.
pub const MAX_SCROLL_AMOUNT: i32 = 10_000;

/// Why a request could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unknown tool: {0}")]
    UnknownCommand(String),

    #[error("missing required argument `{arg}` for {command}")]
    MissingArgument { command: &'static str, arg: &'static str },

    #[error("invalid argument `{arg}` for {command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        arg: &'static str,
        reason: String,
    },
}

/// Requested encoding of a screenshot.
///
/// Only PNG is produced; `jpeg` is accepted for compatibility and answered
/// with PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

/// A fully decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Screenshot {
        format: ImageFormat,
    },
    Click {
        at: Point,
        button: MouseButton,
        clicks: u32,
    },
    TypeText {
        text: String,
    },
    KeyPress {
        key: String,
        modifiers: Vec<String>,
    },
    Scroll {
        direction: ScrollDirection,
        amount: i32,
    },
    MoveMouse {
        to: Point,
    },
    GetMousePosition,
    FocusApp {
        app: String,
    },
    OpenApp {
        app: String,
    },
    ListWindows,
    Wait {
        ms: u64,
    },
}

impl Command {
    /// Decodes `arguments` against the registry entry called `name`.
    pub fn decode(name: &str, arguments: &Map<String, Value>) -> Result<Command, DecodeError> {
        let desc = CommandDescriptor::find(name)
            .ok_or_else(|| DecodeError::UnknownCommand(name.to_string()))?;
        let args = Args { desc, map: arguments };

        let command = match desc.name {
            "screenshot" => Command::Screenshot {
                format: args.choice("format")?,
            },
            "click" => Command::Click {
                at: args.point()?,
                button: args.choice("button")?,
                clicks: args.number("clicks")?.round().max(1.0) as u32,
            },
            "type_text" => Command::TypeText {
                text: args.string("text")?,
            },
            "key_press" => Command::KeyPress {
                key: args.string("key")?,
                modifiers: args.string_list("modifiers")?,
            },
            "scroll" => Command::Scroll {
                direction: args.choice("direction")?,
                amount: args
                    .number("amount")?
                    .round()
                    .clamp(-f64::from(MAX_SCROLL_AMOUNT), f64::from(MAX_SCROLL_AMOUNT))
                    as i32,
            },
            "move_mouse" => Command::MoveMouse { to: args.point()? },
            "get_mouse_position" => Command::GetMousePosition,
            "focus_app" => Command::FocusApp {
                app: args.string("app")?,
            },
            "open_app" => Command::OpenApp {
                app: args.string("app")?,
            },
            "list_windows" => Command::ListWindows,
            "wait" => Command::Wait {
                ms: args.number("ms")?.round().max(0.0) as u64,
            },
            other => return Err(DecodeError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// The registry name this command was decoded from.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Screenshot { .. } => "screenshot",
            Command::Click { .. } => "click",
            Command::TypeText { .. } => "type_text",
            Command::KeyPress { .. } => "key_press",
            Command::Scroll { .. } => "scroll",
            Command::MoveMouse { .. } => "move_mouse",
            Command::GetMousePosition => "get_mouse_position",
            Command::FocusApp { .. } => "focus_app",
            Command::OpenApp { .. } => "open_app",
            Command::ListWindows => "list_windows",
            Command::Wait { .. } => "wait",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument accessor bound to one registry entry.
struct Args<'a> {
    desc: &'static CommandDescriptor,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    /// The supplied value, else the declared default.  `null` counts as absent.
    fn value(&self, name: &'static str) -> Result<Option<Cow<'a, Value>>, DecodeError> {
        if let Some(v) = self.map.get(name).filter(|v| !v.is_null()) {
            return Ok(Some(Cow::Borrowed(v)));
        }
        match self.desc.arg(name) {
            Some(spec) => match spec.default {
                Some(default) => Ok(Some(Cow::Owned(default.to_value()))),
                None if spec.required => Err(self.missing(name)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn present(&self, name: &'static str) -> Result<Cow<'a, Value>, DecodeError> {
        self.value(name)?.ok_or_else(|| self.missing(name))
    }

    fn number(&self, name: &'static str) -> Result<f64, DecodeError> {
        let value = self.present(name)?;
        let n = match value.as_ref() {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match n {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(self.invalid(name, format!("expected a number, got {value}"))),
        }
    }

    fn string(&self, name: &'static str) -> Result<String, DecodeError> {
        let value = self.present(name)?;
        self.coerce_string(name, &value)
    }

    fn string_list(&self, name: &'static str) -> Result<Vec<String>, DecodeError> {
        match self.value(name)? {
            None => Ok(Vec::new()),
            Some(value) => match value.as_ref() {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.coerce_string(name, item))
                    .collect(),
                other => Ok(vec![self.coerce_string(name, other)?]),
            },
        }
    }

    fn choice<T>(&self, name: &'static str) -> Result<T, DecodeError>
    where
        T: FromStr<Err = String>,
    {
        self.string(name)?
            .parse()
            .map_err(|reason| self.invalid(name, reason))
    }

    fn point(&self) -> Result<Point, DecodeError> {
        Ok(Point::new(
            self.number("x")?.round() as i32,
            self.number("y")?.round() as i32,
        ))
    }

    fn coerce_string(&self, name: &'static str, value: &Value) -> Result<String, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(self.invalid(name, format!("expected a string, got {other}"))),
        }
    }

    fn missing(&self, arg: &'static str) -> DecodeError {
        DecodeError::MissingArgument {
            command: self.desc.name,
            arg,
        }
    }

    fn invalid(&self, arg: &'static str, reason: String) -> DecodeError {
        DecodeError::InvalidArgument {
            command: self.desc.name,
            arg,
            reason,
        }
    }
}
