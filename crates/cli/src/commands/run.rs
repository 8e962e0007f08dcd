// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsh run` - submit a goal and wait for its job to finish

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::sync::mpsc;

use wsh_adapters::{Backend, CommandGenerator, HeuristicAnalyzer, StaticGenerator};
use wsh_core::{CommandSpec, Job, JobEvent, SystemClock};
use wsh_engine::{Engagement, EngagementDeps, EngineError};
use wsh_storage::{DatedLogDirs, HistoryStore};

use crate::color;
use crate::config::{GeneratorConfig, WshConfig};
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};

/// How long an interrupted run waits for cancelled commands to settle
const INTERRUPT_SETTLE: Duration = Duration::from_secs(10);

type CliEngagement<G> = Engagement<Backend, G, HeuristicAnalyzer>;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the commands should accomplish
    pub goal: String,

    /// Command to run as given (repeatable); skips generation
    #[arg(long = "cmd", value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// Timeout in seconds for each --cmd command (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Program that generates commands for the goal (overrides config)
    #[arg(long, value_name = "PROGRAM", conflicts_with = "commands")]
    pub generator: Option<PathBuf>,

    /// Extra generator context (repeatable: --context key=value)
    #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub context: Vec<(String, String)>,

    /// Print the finished job as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,
}

/// What to hand the engagement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Submission {
    Commands(Vec<CommandSpec>),
    Generate(BTreeMap<String, String>),
}

pub(crate) fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

impl RunArgs {
    pub(crate) fn submission(&self, default_timeout_secs: u64) -> Submission {
        if self.commands.is_empty() {
            return Submission::Generate(self.context.iter().cloned().collect());
        }
        let timeout = self.timeout.unwrap_or(default_timeout_secs);
        Submission::Commands(
            self.commands.iter().map(|c| CommandSpec::new(c.as_str(), timeout)).collect(),
        )
    }

    /// Generator to use when no literal commands were given
    pub(crate) fn generator(&self, config: &WshConfig) -> Option<GeneratorConfig> {
        self.generator.as_ref().map(GeneratorConfig::new).or_else(|| config.generator.clone())
    }
}

pub async fn handle(args: RunArgs, config: &WshConfig) -> Result<()> {
    let format = OutputFormat::from_json_flag(args.json);
    let goal = args.goal.clone();
    let submission = args.submission(config.engine.default_timeout_secs);
    match submission {
        Submission::Commands(_) => {
            run(config, StaticGenerator::default(), goal, submission, format).await
        }
        Submission::Generate(_) => {
            let Some(generator) = args.generator(config) else {
                return Err(ExitError::usage(
                    "nothing to run: pass --cmd or configure a command generator",
                )
                .into());
            };
            let generator = generator.build(config.engine.default_timeout_secs);
            run(config, generator, goal, submission, format).await
        }
    }
}

async fn run<G: CommandGenerator>(
    config: &WshConfig,
    generator: G,
    goal: String,
    submission: Submission,
    format: OutputFormat,
) -> Result<()> {
    let deps = EngagementDeps {
        backend: Arc::new(super::backend(config).await?),
        generator: Arc::new(generator),
        analyzer: Arc::new(HeuristicAnalyzer::default()),
        store: Arc::new(HistoryStore::new(config.history_dir().map_err(ExitError::from)?)),
        log_dirs: Arc::new(DatedLogDirs::new(config.logs_dir().map_err(ExitError::from)?)),
    };
    let (tx, rx) = mpsc::channel(64);
    let engagement =
        Arc::new(Engagement::new(deps, config.engine.clone(), SystemClock).with_events(tx));
    let printer = tokio::spawn(print_events(rx, format));

    let finished = {
        let work = drive(Arc::clone(&engagement), goal, submission);
        tokio::pin!(work);
        tokio::select! {
            result = &mut work => Some(result?),
            _ = tokio::signal::ctrl_c() => {
                for message in engagement.cancel_all().await {
                    eprintln!("{message}");
                }
                if tokio::time::timeout(INTERRUPT_SETTLE, &mut work).await.is_err() {
                    tracing::warn!("cancelled commands did not settle in time");
                }
                None
            }
        }
    };
    drop(engagement);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "event printer failed");
    }

    let Some(job) = finished else {
        return Err(ExitError::interrupted().into());
    };
    let message = wsh_engine::completion_message(&job);
    output::format_or_json(format, &job, || {
        println!("{} {} {}", color::header("Job"), job.id, color::job_state(job.state));
    })?;
    match ExitError::for_job(job.state, &message) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn drive<G: CommandGenerator>(
    engagement: Arc<CliEngagement<G>>,
    goal: String,
    submission: Submission,
) -> Result<Job, EngineError> {
    let job_id = match submission {
        Submission::Commands(specs) => engagement.submit_commands(&goal, specs).await?,
        Submission::Generate(context) => engagement.submit(&goal, context).await?,
    };
    engagement.wait(&job_id).await
}

/// Progress line for an event, or `None` for events not shown
pub(crate) fn event_line(event: &JobEvent) -> Option<String> {
    match event {
        JobEvent::JobCreated { .. } => None,
        JobEvent::CommandStarted { seq, command, is_retry, .. } => {
            let label = if *is_retry { "retry" } else { "start" };
            Some(format!("[{seq}] {}  {command}", color::muted(label)))
        }
        JobEvent::CommandFinished { seq, state, summary, .. } => {
            let mut line = format!("[{seq}] {}", color::command_state(*state));
            if let Some(summary) = summary {
                line.push_str(&format!("  {summary}"));
            }
            Some(line)
        }
        JobEvent::RetrySubmitted { classification, seqs, .. } => Some(format!(
            "Retrying after {classification} failure: {} replacement command{}",
            seqs.len(),
            if seqs.len() == 1 { "" } else { "s" }
        )),
        JobEvent::RetryFailed { error, .. } => Some(format!("Retry generation failed: {error}")),
        JobEvent::JobFinished { message, .. } => Some(message.clone()),
    }
}

async fn print_events(mut rx: mpsc::Receiver<JobEvent>, format: OutputFormat) {
    while let Some(event) = rx.recv().await {
        if format == OutputFormat::Json {
            continue;
        }
        if let Some(line) = event_line(&event) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
