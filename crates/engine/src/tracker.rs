// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status tracking: polls the executor and moves jobs to their final state.

use crate::executor::CommandExecutor;
use std::sync::Arc;
use thiserror::Error;
use wsh_adapters::ExecutionBackend;
use wsh_core::{Clock, Job, JobId, SharedJob, SystemClock};
use wsh_storage::{JobStore, StoreError};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to persist job {job_id}: {source}")]
    Persist {
        job_id: JobId,
        #[source]
        source: StoreError,
    },
}

/// Human-readable completion line for a finished job
pub fn completion_message(job: &Job) -> String {
    let (_, any_failed) = job.is_all_completed();
    if any_failed {
        "All commands completed. Some commands failed.".to_string()
    } else {
        "All commands completed.".to_string()
    }
}

pub struct StatusTracker<B, C: Clock = SystemClock> {
    executor: CommandExecutor<B, C>,
    store: Arc<dyn JobStore>,
    clock: C,
}

impl<B: ExecutionBackend, C: Clock> StatusTracker<B, C> {
    pub fn new(executor: CommandExecutor<B, C>, store: Arc<dyn JobStore>, clock: C) -> Self {
        Self { executor, store, clock }
    }

    /// Poll the backend once, then report `(all_done, any_failed)` for `job`
    pub async fn check_status(&self, job: &SharedJob) -> (bool, bool) {
        self.executor.check_running().await;
        job.lock().is_all_completed()
    }

    pub fn is_all_completed(job: &Job) -> (bool, bool) {
        job.is_all_completed()
    }

    /// Finalize and persist `job` if every command is terminal.
    ///
    /// The final state is computed on a snapshot and committed to the shared
    /// job only after the snapshot is saved, so a failed save leaves the job
    /// DOING for the next call to retry. Returns `Ok(true)` only on the call
    /// that finalized the job; a job that is already DONE/FAILED is neither
    /// re-stamped nor re-persisted.
    pub fn update_job_state(&self, job: &SharedJob) -> Result<bool, TrackerError> {
        let finished_at_ms = self.clock.epoch_ms();
        let mut snapshot = job.lock().clone();
        if !snapshot.finalize(finished_at_ms) {
            return Ok(false);
        }
        self.store
            .save(&snapshot)
            .map_err(|source| TrackerError::Persist { job_id: snapshot.id.clone(), source })?;

        if !job.lock().finalize(finished_at_ms) {
            return Ok(false);
        }
        tracing::info!(
            job_id = %snapshot.id,
            state = %snapshot.state,
            commands = snapshot.results.len(),
            retries = snapshot.retry_count,
            "job finished"
        );
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
