//! Transport layer for the hangle relay.
//!
//! Provides:
//! - HTTP poll endpoint driven by the remote engine (feature: http)
//! - Terminal line editor with completion and history (feature: tui)

#[cfg(feature = "http")]
pub mod poll;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "http")]
pub use poll::{PollError, PollState, ShutdownReport, create_poll_router, serve, shutdown};
