//! Readiness handshake and remaining-execution countdown.

use std::{sync::OnceLock, time::Duration};

use tokio::{sync::watch, time::Instant};

/// The remote engine's own execution limit.
pub const EXECUTION_CEILING: Duration = Duration::from_secs(30 * 60);

/// Prompt prefix used when no countdown is shown.
pub const PLAIN_PREFIX: &str = "> ";

/// Point in time at which the remote engine stops executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDeadline(Instant);

impl SessionDeadline {
    /// Deadline `ceiling` after `start`.
    #[must_use]
    pub fn starting_at(start: Instant, ceiling: Duration) -> Self {
        Self(start + ceiling)
    }

    /// The deadline instant.
    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.0
    }

    /// Time left at `now`, or `None` once the deadline has passed.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let left = self.0.saturating_duration_since(now);
        (!left.is_zero()).then_some(left)
    }
}

/// Format a duration as `mm:ss`.
#[must_use]
pub fn format_countdown(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Session lifecycle: readiness signal plus the deadline it fixes.
///
/// The deadline is set exactly once, by the first poll ever received.
pub struct Lifecycle {
    ceiling: Duration,
    deadline: OnceLock<SessionDeadline>,
    ready: watch::Sender<bool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(EXECUTION_CEILING)
    }
}

impl Lifecycle {
    /// Create a lifecycle with the given execution ceiling.
    #[must_use]
    pub fn new(ceiling: Duration) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            ceiling,
            deadline: OnceLock::new(),
            ready,
        }
    }

    /// Record the readiness handshake.
    ///
    /// Returns `true` if this call was the handshake, `false` if readiness
    /// had already been recorded (the deadline is left untouched).
    pub fn mark_ready(&self) -> bool {
        let deadline = SessionDeadline::starting_at(Instant::now(), self.ceiling);
        if self.deadline.set(deadline).is_err() {
            return false;
        }
        self.ready.send_replace(true);
        tracing::info!(ceiling_secs = self.ceiling.as_secs(), "Remote engine ready");
        true
    }

    /// Whether the handshake has happened.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.deadline.get().is_some()
    }

    /// Wait for the readiness handshake.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this only returns once ready.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// The session deadline, once set.
    #[must_use]
    pub fn deadline(&self) -> Option<SessionDeadline> {
        self.deadline.get().copied()
    }

    /// Time left before the engine's limit, if counting down.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()?.remaining_at(Instant::now())
    }

    /// Live prompt prefix: `mm:ss> ` while counting down, else `> `.
    #[must_use]
    pub fn prompt_prefix(&self) -> String {
        self.remaining().map_or_else(
            || PLAIN_PREFIX.to_string(),
            |left| format!("{}> ", format_countdown(left)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(Duration::from_secs(30 * 60)), "30:00");
        assert_eq!(format_countdown(Duration::from_secs(65)), "01:05");
        assert_eq!(format_countdown(Duration::from_millis(9_900)), "00:09");
    }

    #[test]
    fn test_remaining_stops_at_deadline() {
        let start = Instant::now();
        let deadline = SessionDeadline::starting_at(start, Duration::from_secs(10));
        assert_eq!(
            deadline.remaining_at(start + Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(deadline.remaining_at(start + Duration::from_secs(10)), None);
        assert_eq!(deadline.remaining_at(start + Duration::from_secs(11)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_set_once() {
        let lifecycle = Lifecycle::default();
        assert!(!lifecycle.is_ready());
        assert_eq!(lifecycle.prompt_prefix(), "> ");

        assert!(lifecycle.mark_ready());
        let first = lifecycle.deadline().unwrap();
        assert_eq!(lifecycle.prompt_prefix(), "30:00> ");

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!lifecycle.mark_ready());
        assert_eq!(lifecycle.deadline().unwrap(), first);
        assert_eq!(lifecycle.prompt_prefix(), "28:59> ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_hidden_after_expiry() {
        let lifecycle = Lifecycle::new(Duration::from_secs(5));
        lifecycle.mark_ready();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(lifecycle.remaining(), None);
        assert_eq!(lifecycle.prompt_prefix(), "> ");
    }

    #[tokio::test]
    async fn test_wait_ready_unblocks() {
        let lifecycle = Arc::new(Lifecycle::default());
        let waiter = {
            let lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.wait_ready().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        lifecycle.mark_ready();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
