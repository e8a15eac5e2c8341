//! The command surface and the wire envelope it travels in.

pub mod command;
pub mod content;
pub mod jsonrpc;
pub mod registry;
