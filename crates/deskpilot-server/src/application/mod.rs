//! Application layer: the capability contract and the use cases built on it.
//!
//! - **`desktop`** – The [`Desktop`](desktop::Desktop) trait every command is
//!   executed against, and its error taxonomy.
//!
//! - **`automate`** – [`AutomationDriver`](automate::AutomationDriver), which
//!   implements `Desktop` over any per-OS
//!   [`NativeBackend`](automate::NativeBackend) and owns the click, chord,
//!   scroll, and enumeration rules shared by every platform.
//!
//! - **`select_driver`** – Resolves the platform driver on first use and
//!   caches it for the life of the process.
//!
//! - **`dispatch`** – Decodes a named request, runs it, and turns every
//!   outcome (including every failure) into a response.

pub mod automate;
pub mod desktop;
pub mod dispatch;
pub mod select_driver;
