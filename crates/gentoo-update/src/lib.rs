//! gentoo-update command-line layer
//!
//! Shared by the `gentoo-update` and `genkernup` binaries: argument
//! handling, logging setup, console output and the interrupt handling
//! around the blocking commands.

pub mod cli;
pub mod commands;
pub mod output;

use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

use gentoo_update_core::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "GENTOO_UPDATE_LOG";

/// Initialize tracing on stderr, `warn` unless [`LOG_ENV`] says otherwise
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Base name of the invoked program
pub fn program_name(arg0: Option<OsString>) -> String {
    arg0.as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gentoo-update".to_string())
}

/// Run a blocking command, exiting with 1 on Ctrl-C
pub async fn run_interruptible<F>(task: F) -> ExitCode
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    run_interruptible_with(task, || {}).await
}

/// Like [`run_interruptible`], running `on_interrupt` before exiting
pub async fn run_interruptible_with<F, C>(task: F, on_interrupt: C) -> ExitCode
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    C: FnOnce(),
{
    let worker = tokio::task::spawn_blocking(task);
    tokio::select! {
        joined = worker => match joined {
            Ok(result) => finish(result),
            Err(e) => {
                output::error(&format!("Worker thread failed: {}", e));
                ExitCode::FAILURE
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("\n{}", Error::Interrupted);
            on_interrupt();
            // The worker may be blocked on a child process or on the terminal
            std::process::exit(1);
        }
    }
}

/// Report the result of a command and turn it into an exit code
pub fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<Error>().is_some_and(Error::is_interrupt) => {
            eprintln!("\n{}", Error::Interrupted);
            ExitCode::FAILURE
        }
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
