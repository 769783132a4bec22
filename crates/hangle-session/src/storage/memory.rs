//! In-memory history storage.

use std::sync::RwLock;

use async_trait::async_trait;
use hangle_core::{HistoryError, HistoryStore};

/// In-memory history.
///
/// Used when no history file is configured, and in tests.
/// Entries are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<String>,
    closed: bool,
}

impl MemoryHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history with existing entries, oldest first.
    #[must_use]
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            inner: RwLock::new(Inner {
                entries: entries.into_iter().map(Into::into).collect(),
                closed: false,
            }),
        }
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.read().is_ok_and(|inner| inner.closed)
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> HistoryError {
    HistoryError::Io(std::io::Error::other(e.to_string()))
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn load(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self.inner.read().map_err(poisoned)?.entries.clone())
    }

    async fn append(&self, line: &str) -> Result<(), HistoryError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.closed {
            return Err(HistoryError::Closed);
        }
        inner.entries.push(line.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), HistoryError> {
        self.inner.write().map_err(poisoned)?.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_then_load() {
        let history = MemoryHistory::with_entries(["a"]);
        history.append("b").await.unwrap();
        assert_eq!(history.load().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let history = MemoryHistory::new();
        history.close().await.unwrap();
        assert!(history.is_closed());
        assert!(matches!(
            history.append("late").await,
            Err(HistoryError::Closed)
        ));
    }
}
