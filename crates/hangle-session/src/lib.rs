//! Command dispatch, completion cache and history for the hangle prompt.
//!
//! Provides:
//! - `Session` - Dispatch submitted lines and answer completion requests
//! - `IntrospectionCache` - Remote property lists keyed by context expression
//! - Output-redirect parsing
//! - History storage implementations (memory, file)

pub mod cache;
pub mod completion;
pub mod dispatcher;
pub mod redirect;
pub mod storage;

pub use cache::IntrospectionCache;
pub use completion::{Completer, Suggestion};
pub use dispatcher::{DispatchError, Outcome, Session, UsageError};
pub use redirect::Redirect;
