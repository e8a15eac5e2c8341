//! # deskpilot-core
//!
//! OS-free building blocks shared by the deskpilot server:
//!
//! - **`keymap`** – The symbolic [`Key`] and [`Modifier`] vocabulary that
//!   callers use in `key_press` requests, case-insensitive name resolution,
//!   and the translation tables from symbolic keys to Windows virtual-key
//!   codes and macOS `CGKeyCode`s.
//!
//! - **`domain`** – Plain values that cross the capability boundary:
//!   [`Point`], [`WindowDescriptor`], [`MouseButton`], [`ScrollDirection`],
//!   and the raw RGBA [`Frame`] a platform driver captures (plus its PNG
//!   encoder).
//!
//! - **`protocol`** – Everything the transport speaks: the static command
//!   registry, the typed [`Command`] decoder, the text/image response
//!   content, and the JSON-RPC 2.0 envelope.
//!
//! Nothing in this crate touches the operating system, so every table and
//! decoding rule is testable on any host.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::frame::{Frame, FrameError};
pub use domain::geometry::{Bounds, Point, WindowDescriptor};
pub use domain::pointer::{MouseButton, ScrollDelta, ScrollDirection};
pub use keymap::{Key, Modifier};
pub use protocol::command::{Command, DecodeError, ImageFormat};
pub use protocol::content::{CommandOutput, ToolContent, ToolResponse};
pub use protocol::registry::{ArgKind, ArgSpec, CommandDescriptor, COMMANDS};
