//! HTTP poll endpoint for the remote engine.
//!
//! The engine cannot be reached directly; it POSTs to this endpoint and
//! reads the next command from the response. Each poll gets exactly one
//! reply.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use bytes::Bytes;
use hangle_core::{Console, Inbound, Lifecycle, Relay, Reply};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tower_http::trace::TraceLayer;

/// Fatal transport error. The process cannot make progress without a
/// working transport.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Failed to read poll body")]
    Transport(#[source] BytesRejection),
}

/// Poll handler state.
#[derive(Clone)]
pub struct PollState {
    relay: Arc<Relay>,
    lifecycle: Arc<Lifecycle>,
    console: Console,
    fatal_tx: mpsc::UnboundedSender<PollError>,
    polls: Arc<AtomicU64>,
}

impl PollState {
    /// Create poll state. Fatal transport errors are sent on `fatal_tx`.
    #[must_use]
    pub fn new(
        relay: Arc<Relay>,
        lifecycle: Arc<Lifecycle>,
        console: Console,
        fatal_tx: mpsc::UnboundedSender<PollError>,
    ) -> Self {
        Self {
            relay,
            lifecycle,
            console,
            fatal_tx,
            polls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Classify one poll body and produce its reply.
    pub async fn handle(&self, body: &str) -> Reply {
        let seq = self.polls.fetch_add(1, Ordering::Relaxed);
        let handshake = self.lifecycle.mark_ready();
        let inbound = Inbound::classify(body);
        tracing::debug!(seq, handshake, ?inbound, "Poll received");

        match inbound {
            Inbound::Keepalive => {}
            Inbound::Log(text) => {
                self.console.say(&text).await;
                return Reply::LogAck;
            }
            Inbound::Payload(_) if handshake => {}
            Inbound::Payload(payload) => {
                if let Err(e) = self.relay.deliver_result(payload) {
                    tracing::warn!(seq, "Discarding result: {e}");
                }
            }
        }

        let wait = self.relay.config().poll_wait;
        match self.relay.await_next_command(wait).await {
            Some(command) => Reply::Command(command),
            None => {
                tracing::debug!(seq, "No command before poll bound");
                Reply::Timeout
            }
        }
    }
}

async fn poll_handler(
    State(state): State<PollState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!("Failed to read poll body: {}", rejection.body_text());
            let _ = state.fatal_tx.send(PollError::Transport(rejection));
            return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
        }
    };

    let reply = state.handle(&String::from_utf8_lossy(&body)).await;
    (StatusCode::OK, reply.into_body())
}

/// Create the poll router. Every path accepts POST, and bodies are read in
/// full whatever their size.
#[must_use]
pub fn create_poll_router(state: PollState) -> Router {
    Router::new()
        .route("/", post(poll_handler))
        .route("/{*path}", post(poll_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve polls on `listener` until `shutdown` resolves, then let in-flight
/// polls finish.
///
/// # Errors
/// Returns error if the server fails.
pub async fn serve<F>(listener: TcpListener, state: PollState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Poll endpoint listening");
    }
    axum::serve(listener, create_poll_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// How an endpoint shutdown went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// A poll collected the queued command before the endpoint stopped.
    pub disconnect_taken: bool,
    /// In-flight polls outlived the grace and the server was aborted.
    pub aborted: bool,
}

/// Stop the endpoint once the engine has had a chance to collect a queued
/// `__DISCONNECT`.
///
/// Waits up to `grace` for the queued command to be taken, signals
/// `stop_tx`, then gives in-flight polls up to another `grace` before
/// aborting `server`.
pub async fn shutdown(
    relay: &Relay,
    stop_tx: &watch::Sender<bool>,
    mut server: JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> ShutdownReport {
    let disconnect_taken = timeout(grace, relay.wait_until_taken()).await.is_ok();
    if !disconnect_taken {
        tracing::warn!("Engine did not collect the disconnect");
    }

    stop_tx.send_replace(true);
    let aborted = match timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => {
            tracing::debug!("Poll endpoint stopped");
            false
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!("Poll endpoint failed: {e}");
            false
        }
        Ok(Err(e)) => {
            tracing::warn!("Poll endpoint task failed: {e}");
            false
        }
        Err(_) => {
            tracing::warn!("Poll endpoint did not stop in time");
            server.abort();
            true
        }
    };

    ShutdownReport {
        disconnect_taken,
        aborted,
    }
}
