// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use wsh_core::{CommandResult, HostDescriptor, Job};

use crate::color;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text_fn(),
    }
    Ok(())
}

/// Compact elapsed time: "45s", "2m", "3h", "4d"
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3_599 => format!("{}m", secs / 60),
        3_600..=86_399 => format!("{}h", secs / 3_600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// Relative time since `epoch_ms` as seen at `now_ms`
pub fn format_time_ago(epoch_ms: u64, now_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    format_elapsed(now_ms.saturating_sub(epoch_ms) / 1000)
}

pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

/// `[2] timeout  sleep 5 (1.0s) - Timed out after 1s.`
pub fn result_line(result: &CommandResult) -> String {
    let mut line = format!("[{}] {}  {}", result.seq, color::command_state(result.state), result.command);
    if let Some(ms) = result.duration_ms() {
        line.push_str(&format!(" ({})", format_duration_ms(ms)));
    }
    if result.is_retry {
        line.push_str(&format!(" {}", color::muted("retry")));
    }
    if let Some(ref summary) = result.log_summary {
        line.push_str(&format!(" - {summary}"));
    }
    line
}

pub fn format_job_list(out: &mut impl Write, jobs: &[Job], now_ms: u64) -> std::io::Result<()> {
    let id_width = jobs.iter().map(|j| j.id.short(12).len()).max().unwrap_or(2).max(2);
    writeln!(out, "{:<id_width$}  {:<6}  {:>4}  {:>4}  GOAL", "ID", "STATE", "CMDS", "AGE")?;
    for job in jobs {
        writeln!(
            out,
            "{:<id_width$}  {:<6}  {:>4}  {:>4}  {}",
            job.id.short(12),
            job.state.to_string(),
            job.results.len(),
            format_time_ago(job.created_at_ms, now_ms),
            job.goal
        )?;
    }
    Ok(())
}

pub fn format_job_detail(out: &mut impl Write, job: &Job) -> std::io::Result<()> {
    writeln!(out, "{} {}", color::header("Job:"), job.id)?;
    writeln!(out, "{} {}", color::header("Goal:"), job.goal)?;
    writeln!(out, "{} {}", color::header("State:"), color::job_state(job.state))?;
    if job.retry_count > 0 {
        writeln!(out, "{} {}", color::header("Retries:"), job.retry_count)?;
    }
    writeln!(out, "{} {}", color::header("Logs:"), job.log_dir.display())?;
    if !job.context.is_empty() {
        writeln!(out, "{}", color::header("Context:"))?;
        for (key, value) in &job.context {
            writeln!(out, "  {key} = {value}")?;
        }
    }
    writeln!(out, "{}", color::header("Commands:"))?;
    for result in job.results.values() {
        writeln!(out, "  {}", result_line(result))?;
    }
    Ok(())
}

pub fn format_host(out: &mut impl Write, host: &HostDescriptor) -> std::io::Result<()> {
    writeln!(out, "{} {}", color::header("Host:"), host)?;
    if !host.inventory.is_empty() {
        writeln!(out, "{} {} executables", color::header("Inventory:"), host.inventory.len())?;
        for name in &host.inventory {
            writeln!(out, "  {}", color::literal(name))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
