//! # souq: Back Office Command Line
//!
//! Entry point for the `souq` binary.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                      │
//! │  2. Initialize tracing (stderr, RUST_LOG)                       │
//! │  3. Dispatch: calculators run offline, everything else loads    │
//! │     ClientConfig and talks to the backend through souq-client   │
//! │  4. Map errors to a one-line message and a non-zero exit code   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod render;

use std::process::ExitCode;

use clap::Parser;
use souq_client::ClientError;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Session;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let session = Session::new(cli.config, cli.json);
    match commands::run(&session, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            match err.downcast_ref::<ClientError>() {
                Some(client) => eprintln!("error: {}", client.user_message()),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `--json` output stays clean on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,souq=debug,souq_client=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
