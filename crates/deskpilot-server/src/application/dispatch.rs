//! Command Dispatcher: decode, execute, and normalise every outcome.
//!
//! [`Dispatcher::invoke`] is the only entry point the transport uses.  It
//! never fails: an unknown name, a bad argument, or a driver error all come
//! back as a [`ToolResponse`] whose single text item reads `Error: ...`.

use std::sync::Arc;
use std::time::Instant;

use deskpilot_core::protocol::command::ImageFormat;
use deskpilot_core::protocol::registry::CommandDescriptor;
use deskpilot_core::{Command, CommandOutput, DecodeError, ToolResponse, COMMANDS};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::desktop::{Desktop, DesktopError};

const PNG_MIME: &str = "image/png";

/// Why a command produced no output.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Decode(DecodeError),

    #[error(transparent)]
    Desktop(#[from] DesktopError),

    #[error("failed to render result: {0}")]
    Render(#[from] serde_json::Error),
}

impl From<DecodeError> for DispatchError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownCommand(name) => DispatchError::UnknownCommand(name),
            other => DispatchError::Decode(other),
        }
    }
}

/// Routes decoded commands to a [`Desktop`].
#[derive(Clone)]
pub struct Dispatcher {
    desktop: Arc<dyn Desktop>,
}

impl Dispatcher {
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }

    /// The full registry, in discovery order.
    pub fn list_commands(&self) -> &'static [CommandDescriptor] {
        COMMANDS
    }

    /// Runs one command and renders its outcome; never fails.
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> ToolResponse {
        let started = Instant::now();
        match self.execute(name, arguments).await {
            Ok(output) => {
                info!(
                    command = name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "command succeeded"
                );
                ToolResponse::success(output)
            }
            Err(err) => {
                warn!(command = name, error = %err, "command failed");
                ToolResponse::error(err)
            }
        }
    }

    /// Decodes and runs one command.
    pub async fn execute(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CommandOutput, DispatchError> {
        let command = Command::decode(name, arguments)?;
        debug!(?command, "dispatching");
        self.run(command).await
    }

    async fn run(&self, command: Command) -> Result<CommandOutput, DispatchError> {
        let desktop = self.desktop.as_ref();
        let text = match command {
            Command::Screenshot { format } => {
                if format == ImageFormat::Jpeg {
                    debug!("jpeg requested; answering with png");
                }
                let bytes = desktop.capture_pixels().await?;
                return Ok(CommandOutput::Image {
                    bytes,
                    mime: PNG_MIME,
                });
            }
            Command::Click { at, button, clicks } => {
                desktop.pointer_click(at, button, clicks).await?;
                format!("Clicked at ({}, {}) with {button} button", at.x, at.y)
            }
            Command::TypeText { text } => {
                desktop.type_text(&text).await?;
                format!("Typed: \"{text}\"")
            }
            Command::KeyPress { key, modifiers } => {
                desktop.key_chord(&key, &modifiers).await?;
                let mut chord = modifiers;
                chord.push(key);
                format!("Pressed: {}", chord.join("+"))
            }
            Command::Scroll { direction, amount } => {
                desktop.scroll_by(direction, amount).await?;
                format!("Scrolled {direction} by {amount}")
            }
            Command::MoveMouse { to } => {
                desktop.move_pointer(to).await?;
                format!("Moved mouse to ({}, {})", to.x, to.y)
            }
            Command::GetMousePosition => {
                let position = desktop.pointer_position().await?;
                serde_json::to_string(&position)?
            }
            Command::FocusApp { app } => {
                desktop.activate_app(&app).await?;
                format!("Focused app: {app}")
            }
            Command::OpenApp { app } => {
                desktop.launch_app(&app).await?;
                format!("Opened app: {app}")
            }
            Command::ListWindows => {
                let windows = desktop.enumerate_windows().await?;
                serde_json::to_string_pretty(&windows)?
            }
            Command::Wait { ms } => {
                desktop.sleep(ms).await?;
                format!("Waited {ms}ms")
            }
        };
        Ok(CommandOutput::Text(text))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
