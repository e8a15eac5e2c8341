//! The static catalogue of supported commands.
//!
//! [`COMMANDS`] is the single source of truth for command names, their
//! descriptions, and their argument shapes.  The transport renders it as
//! JSON Schema for discovery; [`Command::decode`](super::command::Command::decode)
//! uses the same entries to fill defaults and reject unknown names.

use serde_json::{json, Map, Value};

/// The JSON type of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Number,
    String,
    StringList,
}

/// A declared default for an optional argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgDefault {
    Int(i64),
    Str(&'static str),
}

impl ArgDefault {
    pub fn to_value(self) -> Value {
        match self {
            ArgDefault::Int(n) => json!(n),
            ArgDefault::Str(s) => json!(s),
        }
    }
}

/// Schema entry for one argument of a command.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub description: &'static str,
    pub required: bool,
    /// Allowed values; for `StringList` this constrains each item.
    pub allowed: &'static [&'static str],
    pub default: Option<ArgDefault>,
}

impl ArgSpec {
    const fn required(name: &'static str, kind: ArgKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            allowed: &[],
            default: None,
        }
    }

    const fn optional(name: &'static str, kind: ArgKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            allowed: &[],
            default: None,
        }
    }

    const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    const fn with_default(mut self, default: ArgDefault) -> Self {
        self.default = Some(default);
        self
    }

    fn schema(&self) -> Value {
        let mut prop = Map::new();
        let enum_values = || Value::from(self.allowed.to_vec());
        match self.kind {
            ArgKind::Number => {
                prop.insert("type".into(), json!("number"));
            }
            ArgKind::String => {
                prop.insert("type".into(), json!("string"));
                if !self.allowed.is_empty() {
                    prop.insert("enum".into(), enum_values());
                }
            }
            ArgKind::StringList => {
                let mut items = Map::new();
                items.insert("type".into(), json!("string"));
                if !self.allowed.is_empty() {
                    items.insert("enum".into(), enum_values());
                }
                prop.insert("type".into(), json!("array"));
                prop.insert("items".into(), Value::Object(items));
            }
        }
        if let Some(default) = self.default {
            prop.insert("default".into(), default.to_value());
        }
        prop.insert("description".into(), json!(self.description));
        Value::Object(prop)
    }
}

/// One entry of the command registry.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [ArgSpec],
}

impl CommandDescriptor {
    /// Looks a command up by exact name.
    pub fn find(name: &str) -> Option<&'static CommandDescriptor> {
        COMMANDS.iter().find(|c| c.name == name)
    }

    pub fn arg(&self, name: &str) -> Option<&'static ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Renders the argument list as a JSON Schema object.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .args
            .iter()
            .map(|a| (a.name.to_string(), a.schema()))
            .collect();
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        Value::Object(schema)
    }

    /// The `{name, description, inputSchema}` object used in `tools/list`.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

const XY: [ArgSpec; 2] = [
    ArgSpec::required("x", ArgKind::Number, "X coordinate in pixels"),
    ArgSpec::required("y", ArgKind::Number, "Y coordinate in pixels"),
];

/// Every supported command, in discovery order.
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "screenshot",
        description: "Capture a screenshot of the entire screen. Returns the image as base64 PNG.",
        args: &[ArgSpec::optional(
            "format",
            ArgKind::String,
            "Image format (currently only png is supported)",
        )
        .one_of(&["png", "jpeg"])
        .with_default(ArgDefault::Str("png"))],
    },
    CommandDescriptor {
        name: "click",
        description: "Click at screen coordinates. Coordinates are in pixels from top-left.",
        args: &[
            XY[0],
            XY[1],
            ArgSpec::optional("button", ArgKind::String, "Mouse button to click")
                .one_of(&["left", "right", "middle"])
                .with_default(ArgDefault::Str("left")),
            ArgSpec::optional(
                "clicks",
                ArgKind::Number,
                "Number of clicks (1 for single, 2 for double)",
            )
            .with_default(ArgDefault::Int(1)),
        ],
    },
    CommandDescriptor {
        name: "type_text",
        description: "Type text at the current cursor position.",
        args: &[ArgSpec::required("text", ArgKind::String, "Text to type")],
    },
    CommandDescriptor {
        name: "key_press",
        description:
            "Press a keyboard key with optional modifiers. For shortcuts like Cmd+S, use modifiers.",
        args: &[
            ArgSpec::required(
                "key",
                ArgKind::String,
                "Key to press (e.g., \"a\", \"Enter\", \"Tab\", \"F1\")",
            ),
            ArgSpec::optional(
                "modifiers",
                ArgKind::StringList,
                "Modifier keys to hold while pressing",
            )
            .one_of(&["ctrl", "alt", "shift", "meta", "cmd"]),
        ],
    },
    CommandDescriptor {
        name: "scroll",
        description: "Scroll in a direction at the current mouse position.",
        args: &[
            ArgSpec::required("direction", ArgKind::String, "Direction to scroll")
                .one_of(&["up", "down", "left", "right"]),
            ArgSpec::optional("amount", ArgKind::Number, "Amount to scroll (in scroll units)")
                .with_default(ArgDefault::Int(3)),
        ],
    },
    CommandDescriptor {
        name: "move_mouse",
        description: "Move the mouse cursor to screen coordinates.",
        args: &XY,
    },
    CommandDescriptor {
        name: "get_mouse_position",
        description: "Get the current mouse cursor position.",
        args: &[],
    },
    CommandDescriptor {
        name: "focus_app",
        description: "Bring an application to the foreground.",
        args: &[ArgSpec::required(
            "app",
            ArgKind::String,
            "Application name (e.g., \"Safari\", \"Visual Studio Code\", \"Chrome\")",
        )],
    },
    CommandDescriptor {
        name: "open_app",
        description: "Launch an application.",
        args: &[ArgSpec::required(
            "app",
            ArgKind::String,
            "Application name or path (e.g., \"Safari\", \"Google Chrome\")",
        )],
    },
    CommandDescriptor {
        name: "list_windows",
        description: "List all open windows with their app names and titles.",
        args: &[],
    },
    CommandDescriptor {
        name: "wait",
        description: "Wait for a specified duration before continuing.",
        args: &[ArgSpec::required("ms", ArgKind::Number, "Milliseconds to wait")],
    },
];

/// The registry rendered as the `tools` array of a `tools/list` result.
pub fn list_json() -> Value {
    Value::Array(COMMANDS.iter().map(CommandDescriptor::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_is_stable() {
        let names: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                "screenshot",
                "click",
                "type_text",
                "key_press",
                "scroll",
                "move_mouse",
                "get_mouse_position",
                "focus_app",
                "open_app",
                "list_windows",
                "wait",
            ]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }

    #[test]
    fn test_click_schema_declares_required_and_defaults() {
        // Arrange
        let click = CommandDescriptor::find("click").unwrap();

        // Act
        let schema = click.input_schema();

        // Assert
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["x", "y"]));
        assert_eq!(schema["properties"]["button"]["default"], "left");
        assert_eq!(
            schema["properties"]["button"]["enum"],
            json!(["left", "right", "middle"])
        );
        assert_eq!(schema["properties"]["clicks"]["default"], json!(1));
    }

    #[test]
    fn test_modifiers_schema_is_array_of_enum() {
        let key_press = CommandDescriptor::find("key_press").unwrap();
        let schema = key_press.input_schema();

        let modifiers = &schema["properties"]["modifiers"];
        assert_eq!(modifiers["type"], "array");
        assert_eq!(modifiers["items"]["type"], "string");
        assert_eq!(
            modifiers["items"]["enum"],
            json!(["ctrl", "alt", "shift", "meta", "cmd"])
        );
    }

    #[test]
    fn test_argless_commands_have_empty_properties_and_no_required() {
        let schema = CommandDescriptor::find("list_windows")
            .unwrap()
            .input_schema();
        assert_eq!(schema["properties"], json!({}));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_find_is_case_sensitive() {
        assert!(CommandDescriptor::find("click").is_some());
        assert!(CommandDescriptor::find("Click").is_none());
    }

    #[test]
    fn test_list_json_has_one_entry_per_command() {
        let list = list_json();
        let entries = list.as_array().unwrap();
        assert_eq!(entries.len(), COMMANDS.len());
        assert_eq!(entries[0]["name"], "screenshot");
        assert!(entries[0]["inputSchema"].is_object());
    }
}
