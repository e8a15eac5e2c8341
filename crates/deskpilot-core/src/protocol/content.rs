//! Response content returned by a command invocation.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// What a successful command produced, before wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Text(String),
    Image { bytes: Vec<u8>, mime: &'static str },
}

/// One item of a response's `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        /// Standard-alphabet base64 of the encoded image.
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl From<CommandOutput> for ToolContent {
    fn from(output: CommandOutput) -> Self {
        match output {
            CommandOutput::Text(text) => ToolContent::Text { text },
            CommandOutput::Image { bytes, mime } => ToolContent::Image {
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
                mime_type: mime.to_string(),
            },
        }
    }
}

/// The result of `tools/call`.
///
/// A failed command is still a well-formed response: its single text item
/// carries the error message and `is_error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolResponse {
    pub fn success(output: CommandOutput) -> Self {
        Self {
            content: vec![output.into()],
            is_error: false,
        }
    }

    /// Renders any error as `Error: <message>` text content.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {message}"),
            }],
            is_error: true,
        }
    }

    /// The text of the first text item, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Image { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_content_wire_shape() {
        let response = ToolResponse::success(CommandOutput::Text("Waited 5ms".to_string()));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"type": "text", "text": "Waited 5ms"}]})
        );
    }

    #[test]
    fn test_image_content_is_base64_with_mime_type() {
        // Arrange
        let output = CommandOutput::Image {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime: "image/png",
        };

        // Act
        let value = serde_json::to_value(ToolResponse::success(output)).unwrap();

        // Assert
        let item = &value["content"][0];
        assert_eq!(item["type"], "image");
        assert_eq!(item["mimeType"], "image/png");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(item["data"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_error_response_sets_flag_and_prefix() {
        let response = ToolResponse::error("Unknown tool: teleport");
        assert!(response.is_error);
        assert_eq!(response.first_text(), Some("Error: Unknown tool: teleport"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["isError"], true);
    }
}
