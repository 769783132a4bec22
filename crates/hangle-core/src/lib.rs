//! Core abstractions for the hangle poll relay.
//!
//! This crate provides the fundamental building blocks:
//! - `Relay` - Single-slot rendezvous between the prompt and the poller
//! - `Inbound` / `Reply` - Wire protocol sentinels and classification
//! - `Lifecycle` - Readiness handshake and execution countdown
//! - `Console` - Operator-facing output
//! - `ObjectProperty` - Remote member descriptions used by completion
//! - `CommandChannel` and `HistoryStore` traits

pub mod console;
pub mod lifecycle;
pub mod property;
pub mod protocol;
pub mod relay;
pub mod traits;

pub use console::Console;
pub use lifecycle::{Lifecycle, SessionDeadline};
pub use property::ObjectProperty;
pub use protocol::{Inbound, Reply};
pub use relay::{Relay, RelayConfig, RelayError};
pub use traits::{CommandChannel, HistoryError, HistoryStore};
