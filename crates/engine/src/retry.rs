// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feedback loop: asks the generator to replace failed commands.

use crate::executor::CommandExecutor;
use std::sync::Arc;
use wsh_adapters::{
    CommandGenerator, ExecutionBackend, FailureClass, FailureSummary, GenerateRequest,
};
use wsh_core::{
    Clock, CommandResult, CommandSpec, CommandState, SharedJob, SystemClock, TerminalOutcome,
};

/// Command text recorded on the synthetic result of a failed generation
pub(crate) const GENERATION_COMMAND: &str = "(command generation)";

/// What a retry attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// No retry-eligible failures newer than the checkpoint
    NothingToRetry,
    /// The generator offered no replacement commands
    NoReplacement,
    /// Replacement commands were submitted under these sequence numbers
    Resubmitted(Vec<u32>),
    /// The generator failed; a synthetic `ApiError` result was recorded
    ApiError(String),
}

/// Classify a failure batch. Any timeout wins, then any network error.
pub fn classify_failures<I>(states: I) -> FailureClass
where
    I: IntoIterator<Item = CommandState>,
{
    let mut class = FailureClass::Other;
    for state in states {
        match state {
            CommandState::Timeout => return FailureClass::Timeout,
            CommandState::NetworkError => class = FailureClass::NetworkError,
            _ => {}
        }
    }
    class
}

/// Build the generator request for failures past the checkpoint and move
/// the checkpoint over them. `None` when nothing is eligible.
pub(crate) fn take_failures(job: &SharedJob) -> Option<GenerateRequest> {
    let mut job = job.lock();
    let failures: Vec<FailureSummary> = job
        .failures_since_checkpoint()
        .into_iter()
        .filter(|r| r.is_retry_eligible())
        .map(|r| FailureSummary {
            seq: r.seq,
            command: r.command.clone(),
            state: r.state,
            classification: FailureClass::of(r.state),
            log_summary: r.log_summary.clone(),
        })
        .collect();
    job.advance_checkpoint();
    if failures.is_empty() {
        return None;
    }
    job.retry_count += 1;
    Some(GenerateRequest {
        goal: job.goal.clone(),
        classification: Some(classify_failures(failures.iter().map(|f| f.state))),
        prior_failures: failures,
        context: job.context.clone(),
    })
}

pub struct RetryCoordinator<B, G, C: Clock = SystemClock> {
    executor: CommandExecutor<B, C>,
    generator: Arc<G>,
    clock: C,
}

impl<B, G, C: Clock> Clone for RetryCoordinator<B, G, C> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            generator: Arc::clone(&self.generator),
            clock: self.clock.clone(),
        }
    }
}

impl<B, G, C> RetryCoordinator<B, G, C>
where
    B: ExecutionBackend,
    G: CommandGenerator,
    C: Clock,
{
    pub fn new(executor: CommandExecutor<B, C>, generator: Arc<G>, clock: C) -> Self {
        Self { executor, generator, clock }
    }

    /// Hand new failures to the generator and submit its replacements
    pub async fn retry(&self, job: &SharedJob) -> RetryOutcome {
        let Some(request) = take_failures(job) else {
            return RetryOutcome::NothingToRetry;
        };
        match self.replacements(job, &request).await {
            Ok(specs) if specs.is_empty() => RetryOutcome::NoReplacement,
            Ok(specs) => RetryOutcome::Resubmitted(self.executor.submit_batch(job, specs, true).await),
            Err(error) => RetryOutcome::ApiError(error),
        }
    }

    /// Ask the generator for replacements. A failed generation is recorded
    /// on the job as an `ApiError` result and returned as its message.
    pub async fn replacements(
        &self,
        job: &SharedJob,
        request: &GenerateRequest,
    ) -> Result<Vec<CommandSpec>, String> {
        let job_id = job.lock().id.clone();
        tracing::info!(
            %job_id,
            failures = request.prior_failures.len(),
            classification = ?request.classification,
            "requesting replacement commands"
        );

        match self.generator.generate(request).await {
            Ok(specs) => {
                if specs.is_empty() {
                    tracing::info!(%job_id, "generator offered no replacement");
                }
                Ok(specs)
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(%job_id, error = %error, "replacement generation failed");
                record_api_error(job, &error, self.clock.epoch_ms());
                Err(error)
            }
        }
    }
}

/// Append a synthetic `ApiError` result and move the checkpoint past it
pub(crate) fn record_api_error(job: &SharedJob, error: &str, at_ms: u64) -> u32 {
    let mut job = job.lock();
    let seq = job.reserve_seq();
    let outcome = TerminalOutcome::new(CommandState::ApiError, -1).with_summary(error);
    let result = CommandResult::terminal_at_creation(
        seq,
        &CommandSpec::new(GENERATION_COMMAND, 0),
        outcome,
        at_ms,
    );
    if let Err(e) = job.insert_result(result) {
        tracing::warn!(error = %e, "failed to record generation error");
    }
    job.advance_checkpoint();
    seq
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
