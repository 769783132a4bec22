//! Wire protocol between the relay and the remote engine.
//!
//! Every poll is a plaintext POST body; every reply is a plaintext body.
//! Protocol meaning is carried by reserved sentinel strings.

/// Body of a poll that carries no data.
pub const KEEPALIVE: &str = "__KEEPALIVE";

/// Prefix of a poll carrying a progress notice for the operator.
pub const LOG_PREFIX: &str = "__LOG ";

/// Reply sent when no command arrived within the poll bound.
pub const USER_INPUT_TIMEOUT: &str = "__USER_INPUT_TIMEOUT";

/// Command telling the engine to stop polling.
pub const DISCONNECT: &str = "__DISCONNECT";

/// Prefix of the command asking the engine to describe an expression.
pub const DESCRIBE_PREFIX: &str = "__DESCRIBE ";

/// Reply body acknowledging a log notice.
///
/// The engine discards the response to its log requests, so the
/// acknowledgement is an empty body; it is sent without waiting for a
/// command.
pub const LOG_ACK: &str = "";

/// Build the `__DESCRIBE <expr>` command for a context expression.
#[must_use]
pub fn describe_command(context: &str) -> String {
    format!("{DESCRIBE_PREFIX}{context}")
}

/// Classified inbound poll body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// No-op ping; wait for the next command.
    Keepalive,
    /// Progress notice to print; acknowledge immediately.
    Log(String),
    /// Result of the previous command (or the readiness handshake).
    Payload(String),
}

impl Inbound {
    /// Classify a raw poll body.
    #[must_use]
    pub fn classify(body: &str) -> Self {
        if body == KEEPALIVE {
            Self::Keepalive
        } else if let Some(text) = body.strip_prefix(LOG_PREFIX) {
            Self::Log(text.to_string())
        } else {
            Self::Payload(body.to_string())
        }
    }
}

/// Reply to a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The next command, verbatim.
    Command(String),
    /// No command arrived within the bound.
    Timeout,
    /// Acknowledgement of a log notice.
    LogAck,
}

impl Reply {
    /// Render the reply as a response body.
    #[must_use]
    pub fn into_body(self) -> String {
        match self {
            Self::Command(cmd) => cmd,
            Self::Timeout => USER_INPUT_TIMEOUT.to_string(),
            Self::LogAck => LOG_ACK.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keepalive() {
        assert_eq!(Inbound::classify("__KEEPALIVE"), Inbound::Keepalive);
    }

    #[test]
    fn test_classify_log_strips_prefix() {
        assert_eq!(
            Inbound::classify("__LOG hello world"),
            Inbound::Log("hello world".to_string())
        );
    }

    #[test]
    fn test_classify_payload() {
        assert_eq!(
            Inbound::classify("__READY"),
            Inbound::Payload("__READY".to_string())
        );
        // Needs the trailing space to be a log notice.
        assert_eq!(
            Inbound::classify("__LOGGED"),
            Inbound::Payload("__LOGGED".to_string())
        );
        assert_eq!(
            Inbound::classify("__KEEPALIVE "),
            Inbound::Payload("__KEEPALIVE ".to_string())
        );
    }

    #[test]
    fn test_reply_bodies() {
        assert_eq!(Reply::Command("1 + 1".into()).into_body(), "1 + 1");
        assert_eq!(Reply::Timeout.into_body(), "__USER_INPUT_TIMEOUT");
        assert_eq!(Reply::LogAck.into_body(), "");
    }

    #[test]
    fn test_describe_command() {
        assert_eq!(describe_command("a.b"), "__DESCRIBE a.b");
    }
}
