// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command executor: assigns sequence numbers, opens log sinks and hands
//! commands to the backend.

use std::sync::Arc;
use tokio::task::JoinSet;
use wsh_adapters::{ExecutionBackend, Launch, LogSink};
use wsh_core::{
    Clock, CommandKey, CommandResult, CommandSpec, CommandState, HostDescriptor, SharedJob,
    SystemClock, TerminalOutcome,
};

/// Thin front for an [`ExecutionBackend`]
pub struct CommandExecutor<B, C: Clock = SystemClock> {
    backend: Arc<B>,
    clock: C,
}

impl<B, C: Clock> Clone for CommandExecutor<B, C> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), clock: self.clock.clone() }
    }
}

impl<B: ExecutionBackend, C: Clock> CommandExecutor<B, C> {
    pub fn new(backend: Arc<B>, clock: C) -> Self {
        Self { backend, clock }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Submit one command and return its sequence number
    pub async fn submit(&self, job: &SharedJob, spec: CommandSpec, is_retry: bool) -> u32 {
        let seq = job.lock().reserve_seq();
        self.launch(job, Launch::new(seq, spec).retry(is_retry)).await;
        seq
    }

    /// Submit a batch. Sequence numbers follow submission order; the starts
    /// run concurrently and this returns once every start has returned.
    pub async fn submit_batch(
        &self,
        job: &SharedJob,
        specs: Vec<CommandSpec>,
        is_retry: bool,
    ) -> Vec<u32> {
        let launches = self.prepare_batch(job, specs, is_retry);
        let seqs = launches.iter().map(|launch| launch.seq).collect();
        self.launch_batch(job, launches).await;
        seqs
    }

    /// Reserve sequence numbers for `specs` in submission order
    pub fn prepare_batch(
        &self,
        job: &SharedJob,
        specs: Vec<CommandSpec>,
        is_retry: bool,
    ) -> Vec<Launch> {
        let seqs = job.lock().reserve_seqs(specs.len());
        seqs.into_iter()
            .zip(specs)
            .map(|(seq, spec)| Launch::new(seq, spec).retry(is_retry))
            .collect()
    }

    /// Start prepared launches concurrently and wait for every start to return
    pub async fn launch_batch(&self, job: &SharedJob, launches: Vec<Launch>) {
        let count = launches.len();
        let is_retry = launches.iter().any(|launch| launch.is_retry);
        let started = std::time::Instant::now();

        let mut starts = JoinSet::new();
        for launch in launches {
            let executor = self.clone();
            let job = Arc::clone(job);
            starts.spawn(async move { executor.launch(&job, launch).await });
        }
        while let Some(joined) = starts.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "command start task failed");
            }
        }

        tracing::info!(
            backend = self.backend.name(),
            count,
            is_retry,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch submitted"
        );
    }

    async fn launch(&self, job: &SharedJob, launch: Launch) {
        let dir = job.lock().log_dir.clone();
        match LogSink::create(&dir, launch.seq) {
            Ok(sink) => self.backend.start(job, launch, sink).await,
            Err(e) => {
                tracing::error!(seq = launch.seq, error = %e, "cannot open log sink");
                let outcome = TerminalOutcome::new(CommandState::Others, -1)
                    .with_summary(format!("Failed to create log files: {e}"));
                let result = CommandResult::terminal_at_creation(
                    launch.seq,
                    &launch.spec,
                    outcome,
                    self.clock.epoch_ms(),
                )
                .with_retry(launch.is_retry);
                if let Err(e) = job.lock().insert_result(result) {
                    tracing::warn!(error = %e, "failed to record sink failure");
                }
            }
        }
    }

    /// Poll the backend once
    pub async fn check_running(&self) {
        self.backend.poll_running().await;
    }

    pub async fn cancel(&self, key: &CommandKey) -> String {
        self.backend.cancel(key).await
    }

    pub async fn describe_host(&self, full_inventory: bool) -> HostDescriptor {
        self.backend.describe_host(full_inventory).await
    }

    pub fn in_flight(&self) -> Vec<CommandKey> {
        self.backend.in_flight()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
