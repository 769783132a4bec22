//! hangle: interactive prompt for a remote script engine.
//!
//! The engine polls this process over HTTP; each line typed at the prompt
//! is handed to the next poll and the engine's result comes back on the
//! one after.

mod config;
mod logging;
mod script;

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use hangle_core::{Console, HistoryStore, Lifecycle, Relay};
use hangle_session::{
    Outcome, Session,
    dispatcher::EXIT_COMMAND,
    storage::{FileHistory, MemoryHistory},
};
use hangle_transport::{
    PollState,
    tui::{LineEditor, ReadLine},
};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
    task::JoinError,
};

use crate::config::{Cli, Command, SHUTDOWN_GRACE, ServeArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Some(Command::Script) = cli.command {
        print!("{}", script::ENGINE_SCRIPT);
        return ExitCode::SUCCESS;
    }

    match run(cli.serve).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let relay = Arc::new(Relay::default());
    let lifecycle = Arc::new(Lifecycle::default());
    let console = Console::stdout();
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;

    let state = PollState::new(
        Arc::clone(&relay),
        Arc::clone(&lifecycle),
        console.clone().with_crlf(true),
        fatal_tx,
    );
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(hangle_transport::serve(listener, state, async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    }));

    console
        .say(&format!("Waiting for connection on {}", args.listen))
        .await;
    tokio::select! {
        () = lifecycle.wait_ready() => {}
        Some(err) = fatal_rx.recv() => return Err(err.into()),
        res = &mut server => return Err(server_stopped(res)),
    }
    tracing::info!("Engine connected");

    let history: Arc<dyn HistoryStore> = match args.history_path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using history file");
            Arc::new(FileHistory::new(path))
        }
        None => Arc::new(MemoryHistory::new()),
    };

    // Output from here on is written while the editor may hold raw mode.
    let console = console.with_crlf(true);
    let mut session = Session::new(Arc::clone(&relay), history, console);
    let mut editor = LineEditor::new(session.load_history().await);

    loop {
        let read = tokio::select! {
            read = editor.read_line(&mut session, || lifecycle.prompt_prefix()) => {
                read.context("Terminal failure")?
            }
            Some(err) = fatal_rx.recv() => return Err(err.into()),
            res = &mut server => return Err(server_stopped(res)),
        };

        let line = match read {
            ReadLine::Line(line) => line,
            ReadLine::Eof => EXIT_COMMAND.to_string(),
        };

        let outcome = tokio::select! {
            outcome = session.dispatch(&line) => outcome?,
            Some(err) = fatal_rx.recv() => return Err(err.into()),
        };
        if outcome == Outcome::Exit {
            break;
        }
    }

    let report = hangle_transport::shutdown(&relay, &shutdown_tx, server, SHUTDOWN_GRACE).await;
    tracing::debug!(?report, "Poll endpoint shut down");

    session.close().await;
    Ok(())
}

fn server_stopped(res: Result<std::io::Result<()>, JoinError>) -> anyhow::Error {
    match res {
        Ok(Ok(())) => anyhow::anyhow!("Poll endpoint stopped unexpectedly"),
        Ok(Err(e)) => anyhow::Error::new(e).context("Poll endpoint failed"),
        Err(e) => anyhow::Error::new(e).context("Poll endpoint task failed"),
    }
}
