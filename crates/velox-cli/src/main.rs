//! Velox - a command-line client for the Velox planner service.
//!
//! Sign in once; the session tokens are kept between runs and the access
//! token is refreshed automatically when it expires.

mod args;
mod commands;

use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use velox_core::{Config, SessionClient, SessionError};

use args::Command;

/// Exit code used when the user has to sign in again
const EXIT_SIGN_IN_REQUIRED: i32 = 2;

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args::parse(&args)?;
    if command == Command::Help {
        print!("{}", args::USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    info!(base_url = %config.base_url, store = ?config.token_store, "Velox starting");
    let client = SessionClient::from_config(&config)?;

    if let Err(e) = commands::run(&client, command).await {
        let sign_in_required = e
            .downcast_ref::<SessionError>()
            .map(SessionError::requires_sign_in)
            .unwrap_or(false);
        if sign_in_required {
            warn!(error = %e, "Clearing stored session");
            client.sign_out();
            eprintln!("Your session has expired. Run `velox signin <email>` to sign in again.");
            drop(log_guard);
            std::process::exit(EXIT_SIGN_IN_REQUIRED);
        }
        return Err(e);
    }

    Ok(())
}
