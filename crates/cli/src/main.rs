// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsh: run shell commands toward a goal, retrying runtime failures with
//! replacement commands, and keep a history of finished jobs.

mod color;
mod commands;
mod config;
mod env;
mod exit_error;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::WshConfig;
use crate::exit_error::ExitError;

#[derive(Parser)]
#[command(name = "wsh", version = env::VERSION, about = "Goal-driven shell command runner", styles = color::styles())]
struct Cli {
    /// Config file (default: $WSH_CONFIG, then the user config dir's wsh/wsh.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run commands for a goal and wait for the job to finish
    Run(commands::run::RunArgs),
    /// List finished jobs, newest first
    History(commands::history::HistoryArgs),
    /// Show one finished job with its command results
    Show(commands::history::ShowArgs),
    /// Describe the host commands run on
    Host(commands::host::HostArgs),
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run().await {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("error: {e:#}");
                exit_error::codes::FAILED
            }
        };
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let config = WshConfig::load(cli.config.as_deref()).map_err(ExitError::from)?;

    match command {
        Commands::Run(args) => commands::run::handle(args, &config).await,
        Commands::History(args) => commands::history::handle_history(args, &config),
        Commands::Show(args) => commands::history::handle_show(args, &config),
        Commands::Host(args) => commands::host::handle(args, &config).await,
    }
}

/// Logs go to stderr so stdout stays parseable
fn init_logging() {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
