// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vigild: the Vigil scan controller daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vg_server::config::ControllerConfig;

#[derive(Parser)]
#[command(name = "vigild", about = "Vigil scan controller", version)]
struct Args {
    /// Path to vigild.toml
    #[arg(short, long, default_value = "/etc/vigild/vigild.toml")]
    config: PathBuf,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vg_server=info,tower_http=warn"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vigild.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ControllerConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("vigild: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(config.log_dir.as_ref());

    match vg_server::runtime::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "controller failed");
            eprintln!("vigild: {err}");
            ExitCode::FAILURE
        }
    }
}
