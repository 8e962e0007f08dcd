// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsh history` and `wsh show` - read persisted jobs

use anyhow::Result;
use clap::Args;
use wsh_core::{Clock, SystemClock};
use wsh_storage::{HistoryStore, StoreError};

use crate::config::WshConfig;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of jobs to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Show every job
    #[arg(long, conflicts_with = "limit")]
    pub all: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Job ID or unique prefix (the `job-` prefix may be omitted)
    pub id: String,

    #[arg(long)]
    pub json: bool,
}

fn store(config: &WshConfig) -> Result<HistoryStore, ExitError> {
    Ok(HistoryStore::new(config.history_dir()?))
}

pub fn handle_history(args: HistoryArgs, config: &WshConfig) -> Result<()> {
    let mut jobs = store(config)?.list()?;
    let total = jobs.len();
    if !args.all {
        jobs.truncate(args.limit);
    }
    let format = OutputFormat::from_json_flag(args.json);
    output::format_or_json(format, &jobs, || {
        if jobs.is_empty() {
            println!("No jobs");
            return;
        }
        let mut out = std::io::stdout().lock();
        if let Err(e) = output::format_job_list(&mut out, &jobs, SystemClock.epoch_ms()) {
            tracing::debug!(error = %e, "stdout closed");
        }
        if jobs.len() < total {
            println!("... {} more (use --all)", total - jobs.len());
        }
    })
}

pub fn handle_show(args: ShowArgs, config: &WshConfig) -> Result<()> {
    let job = match store(config)?.resolve(&args.id) {
        Ok(job) => job,
        Err(e @ (StoreError::NotFound(_) | StoreError::Ambiguous { .. })) => {
            return Err(ExitError::new(crate::exit_error::codes::FAILED, e.to_string()).into());
        }
        Err(e) => return Err(e.into()),
    };
    let format = OutputFormat::from_json_flag(args.json);
    output::format_or_json(format, &job, || {
        let mut out = std::io::stdout().lock();
        if let Err(e) = output::format_job_detail(&mut out, &job) {
            tracing::debug!(error = %e, "stdout closed");
        }
    })
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
