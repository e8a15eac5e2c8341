//! Session Transport: MCP over line-delimited JSON-RPC 2.0.
//!
//! One JSON object per line in each direction.  Requests are handled
//! strictly in arrival order: the next line is not read until the previous
//! response has been written and flushed, so two commands can never inject
//! input concurrently.
//!
//! Methods served:
//! - `initialize` – protocol version, capabilities, server info
//! - `ping` – empty result
//! - `tools/list` – the command registry with a JSON Schema per command
//! - `tools/call` – one command through the [`Dispatcher`]
//!
//! Notifications (requests without an `id`) are never answered.
//!
//! # Shutdown
//!
//! Both the read of the next line and the in-flight dispatch race the
//! caller-supplied `shutdown` future.  When it resolves the session flushes
//! what it has written and returns [`SessionEnd::Signal`]; an abandoned
//! native call finishes on the blocking pool, bounded by the runtime's
//! shutdown timeout in the binary.

use std::future::Future;

use deskpilot_core::protocol::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use deskpilot_core::protocol::registry::CommandDescriptor;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::application::dispatch::Dispatcher;

/// Protocol revision reported when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "deskpilot";

/// Why [`McpSession::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The shutdown future resolved.
    Signal,
    /// The input stream reached EOF.
    StreamClosed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The single session a process serves.
pub struct McpSession {
    dispatcher: Dispatcher,
}

impl McpSession {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serves requests from `reader` until EOF or `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Only transport failures: a read or write error on the streams.
    /// Command failures are always rendered into the response.
    pub async fn run<R, W, S>(
        &self,
        reader: R,
        mut writer: W,
        shutdown: S,
    ) -> Result<SessionEnd, SessionError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut lines = reader.lines();
        info!("session started");

        let end = loop {
            let next = tokio::select! {
                biased;
                () = &mut shutdown => break SessionEnd::Signal,
                next = lines.next_line() => next?,
            };
            let Some(raw) = next else {
                break SessionEnd::StreamClosed;
            };
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let response = tokio::select! {
                biased;
                () = &mut shutdown => break SessionEnd::Signal,
                response = self.handle_line(line) => response,
            };
            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        };

        writer.flush().await?;
        info!(?end, "session ended");
        Ok(end)
    }

    /// Handles one line of input; `None` means nothing is sent back.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "unparseable request line");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    "Parse error",
                ));
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ));
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification received");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result(request.params.as_ref())),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.tools_list()),
            "tools/call" => self.call_tool(id, request.params.as_ref()).await,
            other => {
                warn!(method = other, "unknown method");
                JsonRpcResponse::failure(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {other}"),
                )
            }
        };
        Some(response)
    }

    /// The registry as seen through the dispatcher, in discovery order.
    fn tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .dispatcher
            .list_commands()
            .iter()
            .map(CommandDescriptor::to_json)
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, id: Value, params: Option<&Value>) -> JsonRpcResponse {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);

        let result = self.dispatcher.invoke(name, &arguments).await;
        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

fn initialize_result(params: Option<&Value>) -> Value {
    let version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": version,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<(), SessionError> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
