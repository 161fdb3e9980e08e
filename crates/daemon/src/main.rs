// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lrsd`: the Local Resource Scheduler daemon (`spec.md` §2, §6).
//!
//! Architecture:
//! - Listener task(s): accept client connections, frame requests/responses
//! - Per-family scheduler tasks: dispatch queued allocations onto device workers
//! - Device worker tasks: one per drive, serializing its library/filesystem/DSS calls

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::time::Duration;

use clap::Parser;
use lrs_daemon::env;
use lrs_daemon::lifecycle::{Config, DaemonState};
use lrs_daemon::{listener, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// `spec.md` §4.5: the shutdown sequence is bounded by a hard 10s deadline.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "lrsd", about = "Local Resource Scheduler daemon")]
struct Cli {
    /// Run interactively: logs to stderr and tolerates a missing
    /// `DAEMON_PID_FILEPATH` (`spec.md` §6).
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Increase log verbosity (repeatable: `-v` = debug, `-vv` = trace).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("lrsd: {e}");
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<(), LifecycleError> {
    // `spec.md` T8: the pidfile var must be validated before the lockfile
    // is ever created, so a missing var leaves no lockfile on disk.
    let pid_path = if cli.interactive {
        env::pid_filepath().ok()
    } else {
        Some(env::pid_filepath()?)
    };

    let config = Config::load(&env::config_path())?;
    let _log_guard = setup_logging(&config, cli.interactive, cli.verbose);

    async_main(config, pid_path).await
}

async fn async_main(config: Config, pid_path: Option<std::path::PathBuf>) -> Result<(), LifecycleError> {
    info!("starting lrsd");
    let state = DaemonState::startup(config).await?;
    info!(pid = state.pid, hostname = %state.hostname, "lock recovery complete, accepting connections");

    if let Some(path) = &pid_path {
        if let Err(e) = std::fs::write(path, state.pid.to_string()) {
            error!(error = %e, "failed to write pidfile");
        }
    }

    let mut sigterm = signal(SignalKind::terminate()).map_err(LifecycleError::Io)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(LifecycleError::Io)?;

    let shutdown_signal = async {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };

    listener::serve(std::sync::Arc::clone(&state), shutdown_signal).await;

    info!("shutting down");
    state.shutdown(SHUTDOWN_DEADLINE).await;
    info!("shutdown complete");
    Ok(())
}

fn setup_logging(
    config: &Config,
    interactive: bool,
    verbosity: u8,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if interactive || config.lrs.log_path.is_none() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return None;
    }

    let Some(log_path) = config.lrs.log_path.as_ref() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return None;
    };
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Some(file_name) = log_path.file_name() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return None;
    };
    let appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        file_name,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();
    Some(guard)
}
