//! Session: dispatch submitted lines and answer completion requests.

use std::path::PathBuf;

use async_trait::async_trait;
use hangle_core::{
    CommandChannel, Console, HistoryStore, RelayError, protocol::DISCONNECT,
};

use crate::{
    cache::IntrospectionCache,
    completion::{self, Completer, Suggestion},
    redirect::Redirect,
};

/// Line that ends the session.
pub const EXIT_COMMAND: &str = "exit";

/// Dispatch error. Ends the session.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Usage error. Reported to the operator; the session continues.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Failed to write output to {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What the prompt loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Read the next line.
    Continue,
    /// `__DISCONNECT` is queued; shut the transport down and exit.
    Exit,
}

/// Interactive session state.
///
/// Owns the introspection cache; dispatch and completion both run on the
/// prompt's task and never overlap, so the cache needs no lock.
pub struct Session<C, H>
where
    C: CommandChannel,
    H: HistoryStore,
{
    channel: C,
    history: H,
    console: Console,
    cache: IntrospectionCache,
}

impl<C, H> Session<C, H>
where
    C: CommandChannel,
    H: HistoryStore,
{
    /// Create a new session.
    #[must_use]
    pub fn new(channel: C, history: H, console: Console) -> Self {
        Self {
            channel,
            history,
            console,
            cache: IntrospectionCache::new(),
        }
    }

    /// Previous input lines, oldest first. Empty if history is unreadable.
    pub async fn load_history(&self) -> Vec<String> {
        self.history.load_or_empty().await
    }

    /// The introspection cache.
    #[must_use]
    pub const fn cache(&self) -> &IntrospectionCache {
        &self.cache
    }

    /// Dispatch one submitted line.
    ///
    /// Lines that are empty or only whitespace are skipped: nothing is sent
    /// to the engine and nothing is recorded in history.
    ///
    /// # Errors
    /// Returns error if the relay fails; usage errors are reported to the
    /// operator instead.
    pub async fn dispatch(&mut self, line: &str) -> Result<Outcome, DispatchError> {
        if line.trim().is_empty() {
            return Ok(Outcome::Continue);
        }

        if let Err(e) = self.history.append(line).await {
            tracing::warn!("Failed to append to history: {e}");
        }

        if line == EXIT_COMMAND {
            self.channel.enqueue(DISCONNECT).await?;
            tracing::info!("Disconnect queued");
            return Ok(Outcome::Exit);
        }

        if let Some(redirect) = Redirect::parse(line) {
            let result = self.channel.send_command(redirect.command).await?;
            match write_output(redirect.target, result).await {
                Ok(()) => {
                    self.console
                        .say(&format!("Wrote output to file {}", redirect.target))
                        .await;
                }
                Err(e) => self.console.say(&e.to_string()).await,
            }
        } else {
            let result = self.channel.send_command(line).await?;
            self.console.say(&result).await;
        }

        // Remote state may have changed.
        self.cache.invalidate_all();
        Ok(Outcome::Continue)
    }

    /// Release the history backend.
    pub async fn close(&self) {
        if let Err(e) = self.history.close().await {
            tracing::warn!("Failed to close history: {e}");
        }
    }
}

async fn write_output(target: &str, mut result: String) -> Result<(), UsageError> {
    result.push('\n');
    tokio::fs::write(target, result)
        .await
        .map_err(|source| UsageError::WriteOutput {
            path: PathBuf::from(target),
            source,
        })
}

#[async_trait]
impl<C, H> Completer for Session<C, H>
where
    C: CommandChannel,
    H: HistoryStore,
{
    async fn complete(&mut self, before_cursor: &str) -> Vec<Suggestion> {
        let chain = completion::extract_chain(before_cursor);
        let Some((context, filter)) = completion::split_chain(chain) else {
            return Vec::new();
        };

        match self.cache.lookup(&self.channel, context).await {
            Ok(properties) => completion::filter_properties(properties, filter),
            Err(e) => {
                tracing::warn!(%context, "Completion lookup failed: {e}");
                Vec::new()
            }
        }
    }
}
