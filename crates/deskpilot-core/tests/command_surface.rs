//! Integration tests for the command surface: the registry and the decoder
//! must agree on every command name and every declared default.

use deskpilot_core::protocol::registry::{ArgKind, COMMANDS};
use deskpilot_core::{Command, DecodeError, MouseButton, Point};
use serde_json::{json, Map, Value};

/// Builds the smallest argument map that satisfies `name`'s required fields.
fn minimal_arguments(name: &str) -> Map<String, Value> {
    let descriptor = COMMANDS.iter().find(|c| c.name == name).unwrap();
    descriptor
        .args
        .iter()
        .filter(|a| a.required)
        .map(|a| {
            let value = match (a.kind, a.allowed.first()) {
                (ArgKind::Number, _) => json!(1),
                (ArgKind::String, Some(first)) => json!(first),
                (ArgKind::String, None) => json!("value"),
                (ArgKind::StringList, _) => json!([]),
            };
            (a.name.to_string(), value)
        })
        .collect()
}

#[test]
fn test_every_registered_command_decodes_with_minimal_arguments() {
    for descriptor in COMMANDS {
        // Arrange
        let arguments = minimal_arguments(descriptor.name);

        // Act
        let command = Command::decode(descriptor.name, &arguments)
            .unwrap_or_else(|e| panic!("{} failed to decode: {e}", descriptor.name));

        // Assert
        assert_eq!(command.name(), descriptor.name);
    }
}

#[test]
fn test_every_required_argument_is_enforced() {
    for descriptor in COMMANDS {
        for required in descriptor.args.iter().filter(|a| a.required) {
            let mut arguments = minimal_arguments(descriptor.name);
            arguments.remove(required.name);

            let err = Command::decode(descriptor.name, &arguments).unwrap_err();

            assert_eq!(
                err,
                DecodeError::MissingArgument {
                    command: descriptor.name,
                    arg: required.name,
                }
            );
        }
    }
}

#[test]
fn test_names_outside_registry_are_unknown() {
    for name in ["", "Screenshot", "tools/call", "click "] {
        let err = Command::decode(name, &Map::new()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownCommand(name.to_string()));
    }
}

#[test]
fn test_double_click_request_decodes_end_to_end() {
    let arguments = match json!({"x": "640", "y": 360.2, "button": "Left", "clicks": 2}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };

    let command = Command::decode("click", &arguments).unwrap();

    assert_eq!(
        command,
        Command::Click {
            at: Point::new(640, 360),
            button: MouseButton::Left,
            clicks: 2,
        }
    );
}
