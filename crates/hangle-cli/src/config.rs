//! Command-line and environment configuration.

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Args, Parser, Subcommand};
use hangle_session::storage::FileHistory;

/// How long exit waits for the engine to collect `__DISCONNECT`, and then
/// again for in-flight polls to finish.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(
    name = "hangle",
    version,
    about = "Interactive prompt for a remote script engine that reaches you by polling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the polling loop to paste into the remote script project.
    Script,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address the poll endpoint binds to.
    #[arg(long, env = "HANGLE_LISTEN", default_value = "0.0.0.0:80")]
    pub listen: String,

    /// History file (default: ~/.hangle_history).
    #[arg(long, env = "HANGLE_HISTORY", conflicts_with = "no_history")]
    pub history: Option<PathBuf>,

    /// Keep history in memory only.
    #[arg(long)]
    pub no_history: bool,
}

impl ServeArgs {
    /// History file to use, if any.
    #[must_use]
    pub fn history_path(&self) -> Option<PathBuf> {
        if self.no_history {
            return None;
        }
        self.history.clone().or_else(FileHistory::default_path)
    }
}
