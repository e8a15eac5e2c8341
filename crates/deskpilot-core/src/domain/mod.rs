//! Plain values exchanged across the capability boundary.

pub mod frame;
pub mod geometry;
pub mod pointer;
