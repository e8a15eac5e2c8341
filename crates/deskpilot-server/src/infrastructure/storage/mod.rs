//! Storage infrastructure: the read-only configuration file.
//!
//! The server only ever reads `config.toml`; a missing file means defaults.

pub mod config;
