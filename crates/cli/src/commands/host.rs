// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsh host` - describe the machine commands run on

use anyhow::Result;
use clap::Args;
use wsh_adapters::ExecutionBackend;

use crate::config::WshConfig;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Include the executable inventory from PATH
    #[arg(long)]
    pub full: bool,

    #[arg(long)]
    pub json: bool,
}

pub async fn handle(args: HostArgs, config: &WshConfig) -> Result<()> {
    let backend = super::backend(config).await?;
    let host = backend.describe_host(args.full).await;
    if host.is_degraded() {
        tracing::warn!(host = %host, "host description is degraded");
    }
    output::format_or_json(OutputFormat::from_json_flag(args.json), &host, || {
        let mut out = std::io::stdout().lock();
        if let Err(e) = output::format_host(&mut out, &host) {
            tracing::debug!(error = %e, "stdout closed");
        }
    })
}
