use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing on stderr so logs never mix with command results.
pub fn init_logging(verbosity: u8) {
    // 0 = warnings only, the prompt owns the terminal
    // 1 (-v) = lifecycle events
    // 2+ (-vv) = every poll
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}
