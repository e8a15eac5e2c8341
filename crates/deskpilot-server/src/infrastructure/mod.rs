//! Infrastructure layer: everything that touches the OS or the outside world.
//!
//! - **`native`** – [`NativeBackend`](crate::application::automate::NativeBackend)
//!   implementations for macOS and Windows, plus the recording mock.
//! - **`session`** – the MCP stdio transport.
//! - **`storage`** – the TOML configuration file.

pub mod native;
pub mod session;
pub mod storage;
