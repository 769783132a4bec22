//! Single-slot rendezvous between the prompt and the poller.
//!
//! Two independent slots carry the two directions of an exchange:
//! commands flow out through a one-element queue that polls drain, and the
//! result of each command flows back through a one-shot slot owned by the
//! caller that sent it. The `exchange` lock is held from enqueue until the
//! result arrives, so a second command never becomes visible to a poll
//! before the first one's result has been handed back.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::{self, Notify, mpsc, oneshot};

/// Upper bound a poll waits for the next command.
pub const POLL_WAIT: Duration = Duration::from_secs(45);

/// Relay tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// How long a poll waits for a command before replying with a timeout.
    pub poll_wait: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_wait: POLL_WAIT,
        }
    }
}

/// Relay error.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay closed before the exchange completed")]
    Closed,
    #[error("No command is awaiting a result")]
    NoPendingExchange,
}

/// Rendezvous point pairing one outbound command with one inbound result.
pub struct Relay {
    config: RelayConfig,
    exchange: sync::Mutex<()>,
    command_tx: mpsc::Sender<String>,
    command_rx: sync::Mutex<mpsc::Receiver<String>>,
    result_slot: Mutex<Option<oneshot::Sender<String>>>,
    taken: Notify,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

impl Relay {
    /// Create a new relay.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(1);
        Self {
            config,
            exchange: sync::Mutex::new(()),
            command_tx,
            command_rx: sync::Mutex::new(command_rx),
            result_slot: Mutex::new(None),
            taken: Notify::new(),
        }
    }

    /// Relay configuration.
    #[must_use]
    pub const fn config(&self) -> RelayConfig {
        self.config
    }

    /// Send a command and wait for the result of the poll that consumes it.
    ///
    /// Callers queue behind any exchange already in flight.
    ///
    /// # Cancel safety
    /// Dropping the future after the command was taken by a poll leaves the
    /// engine's result unmatched; it is discarded when it arrives.
    ///
    /// # Errors
    /// Returns `RelayError::Closed` if the result slot is dropped before a
    /// result arrives.
    pub async fn send_command(&self, command: impl Into<String>) -> Result<String, RelayError> {
        let command = command.into();
        let _exchange = self.exchange.lock().await;

        let (result_tx, result_rx) = oneshot::channel();
        *self.slot() = Some(result_tx);

        tracing::debug!(%command, "Queued command");
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RelayError::Closed)?;

        result_rx.await.map_err(|_| RelayError::Closed)
    }

    /// Queue a command without waiting for a result.
    ///
    /// Used for `__DISCONNECT`: the engine stops polling after reading it,
    /// so no result ever comes back. Returns as soon as the command sits in
    /// the slot, whether or not a poll is currently waiting.
    ///
    /// # Errors
    /// Returns `RelayError::Closed` if the command slot is gone.
    pub async fn enqueue(&self, command: impl Into<String>) -> Result<(), RelayError> {
        let command = command.into();
        let _exchange = self.exchange.lock().await;
        tracing::debug!(%command, "Queued command without result");
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RelayError::Closed)
    }

    /// Wait up to `wait` for the next command.
    ///
    /// Returns `None` when the bound elapses. Taking the command and
    /// returning it happen under the receiver lock, so concurrent polls can
    /// never both observe the same command.
    pub async fn await_next_command(&self, wait: Duration) -> Option<String> {
        let command = tokio::time::timeout(wait, async {
            let mut rx = self.command_rx.lock().await;
            rx.recv().await
        })
        .await
        .ok()
        .flatten();
        if command.is_some() {
            self.taken.notify_waiters();
        }
        command
    }

    /// Wait until no command sits in the outbound slot.
    ///
    /// Lets shutdown give the engine's next poll a chance to pick up a
    /// queued `__DISCONNECT`.
    pub async fn wait_until_taken(&self) {
        loop {
            let taken = self.taken.notified();
            if self.command_tx.capacity() == self.command_tx.max_capacity() {
                return;
            }
            taken.await;
        }
    }

    /// Hand a result to the caller waiting in `send_command`.
    ///
    /// # Errors
    /// Returns `RelayError::NoPendingExchange` if no caller is waiting.
    pub fn deliver_result(&self, payload: impl Into<String>) -> Result<(), RelayError> {
        let waiter = self.slot().take();
        match waiter {
            Some(tx) => tx
                .send(payload.into())
                .map_err(|_| RelayError::NoPendingExchange),
            None => Err(RelayError::NoPendingExchange),
        }
    }

    /// Whether a command is waiting for its result.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<String>>> {
        self.result_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_pending, assert_ready};

    use super::*;
    use crate::protocol::DISCONNECT;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_exchange_roundtrip() {
        let relay = Arc::new(Relay::default());

        let caller = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.send_command("1 + 1").await })
        };

        let cmd = relay.await_next_command(SHORT * 10).await;
        assert_eq!(cmd.as_deref(), Some("1 + 1"));
        assert!(relay.is_pending());

        relay.deliver_result("2").unwrap();
        assert_eq!(caller.await.unwrap().unwrap(), "2");
        assert!(!relay.is_pending());
    }

    #[tokio::test]
    async fn test_send_blocks_until_result() {
        let relay = Relay::default();
        let mut fut = tokio_test::task::spawn(relay.send_command("x"));

        assert_pending!(fut.poll());
        assert_eq!(relay.await_next_command(SHORT).await.as_deref(), Some("x"));
        assert_pending!(fut.poll());

        relay.deliver_result("done").unwrap();
        assert!(fut.is_woken());
        let out = assert_ready!(fut.poll());
        assert_eq!(out.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_second_command_hidden_until_first_resolves() {
        let relay = Arc::new(Relay::default());

        let first = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.send_command("c1").await })
        };
        assert_eq!(relay.await_next_command(SHORT * 10).await.as_deref(), Some("c1"));

        let second = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.send_command("c2").await })
        };

        // c2 must not be visible while c1 is unresolved.
        assert_eq!(relay.await_next_command(SHORT).await, None);
        assert!(!second.is_finished());

        relay.deliver_result("r1").unwrap();
        assert_eq!(first.await.unwrap().unwrap(), "r1");

        assert_eq!(relay.await_next_command(SHORT * 10).await.as_deref(), Some("c2"));
        relay.deliver_result("r2").unwrap();
        assert_eq!(second.await.unwrap().unwrap(), "r2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_wait_elapses_and_relay_stays_usable() {
        let relay = Arc::new(Relay::default());

        assert_eq!(relay.await_next_command(POLL_WAIT).await, None);

        let caller = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.send_command("later").await })
        };
        assert_eq!(relay.await_next_command(POLL_WAIT).await.as_deref(), Some("later"));
        relay.deliver_result("ok").unwrap();
        assert_eq!(caller.await.unwrap().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_deliver_without_pending_exchange() {
        let relay = Relay::default();
        assert!(matches!(
            relay.deliver_result("stray"),
            Err(RelayError::NoPendingExchange)
        ));
    }

    #[tokio::test]
    async fn test_enqueue_does_not_wait_for_a_poll() {
        let relay = Relay::default();

        tokio::time::timeout(SHORT, relay.enqueue(DISCONNECT))
            .await
            .expect("enqueue must not block without a poller")
            .unwrap();

        assert!(!relay.is_pending());
        assert_eq!(
            relay.await_next_command(SHORT).await.as_deref(),
            Some(DISCONNECT)
        );
    }

    #[tokio::test]
    async fn test_wait_until_taken() {
        let relay = Arc::new(Relay::default());
        relay.wait_until_taken().await;

        relay.enqueue(DISCONNECT).await.unwrap();
        let drained = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.wait_until_taken().await })
        };
        tokio::task::yield_now().await;
        assert!(!drained.is_finished());

        assert!(relay.await_next_command(SHORT).await.is_some());
        tokio::time::timeout(SHORT * 10, drained)
            .await
            .unwrap()
            .unwrap();
    }
}
