//! Seams between the core and its collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::relay::{Relay, RelayError};

/// Something that can carry a command to the remote engine and return
/// its result.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Send a command and wait for its result.
    async fn send_command(&self, command: &str) -> Result<String, RelayError>;

    /// Queue a command whose result is never awaited.
    async fn enqueue(&self, command: &str) -> Result<(), RelayError>;
}

#[async_trait]
impl CommandChannel for Relay {
    async fn send_command(&self, command: &str) -> Result<String, RelayError> {
        Self::send_command(self, command).await
    }

    async fn enqueue(&self, command: &str) -> Result<(), RelayError> {
        Self::enqueue(self, command).await
    }
}

#[async_trait]
impl<C: CommandChannel + ?Sized> CommandChannel for Arc<C> {
    async fn send_command(&self, command: &str) -> Result<String, RelayError> {
        (**self).send_command(command).await
    }

    async fn enqueue(&self, command: &str) -> Result<(), RelayError> {
        (**self).enqueue(command).await
    }
}

/// History error.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("History is closed")]
    Closed,
}

/// Trait for input history backends.
///
/// Entries are ordered oldest-first and only ever appended.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load all entries, oldest first.
    async fn load(&self) -> Result<Vec<String>, HistoryError>;

    /// Append one line.
    async fn append(&self, line: &str) -> Result<(), HistoryError>;

    /// Flush and release the backend. Later appends fail with `Closed`.
    async fn close(&self) -> Result<(), HistoryError>;

    /// Load entries, degrading to an empty history on failure.
    async fn load_or_empty(&self) -> Vec<String> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to load history: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<H: HistoryStore + ?Sized> HistoryStore for Arc<H> {
    async fn load(&self) -> Result<Vec<String>, HistoryError> {
        (**self).load().await
    }

    async fn append(&self, line: &str) -> Result<(), HistoryError> {
        (**self).append(line).await
    }

    async fn close(&self) -> Result<(), HistoryError> {
        (**self).close().await
    }
}
