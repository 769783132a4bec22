//! The engine-side polling loop, printed by `hangle script`.

/// JavaScript for the remote script host.
pub const ENGINE_SCRIPT: &str = include_str!("../assets/engine.js");

#[cfg(test)]
mod tests {
    use hangle_core::protocol::{
        DESCRIBE_PREFIX, DISCONNECT, KEEPALIVE, LOG_PREFIX, USER_INPUT_TIMEOUT,
    };

    use super::*;

    #[test]
    fn test_script_speaks_the_protocol() {
        for sentinel in [
            KEEPALIVE,
            DISCONNECT,
            USER_INPUT_TIMEOUT,
            DESCRIBE_PREFIX.trim_end(),
            LOG_PREFIX,
            "__READY",
        ] {
            assert!(ENGINE_SCRIPT.contains(sentinel), "missing {sentinel}");
        }
    }
}
