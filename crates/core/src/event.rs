// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observation events emitted by the engagement as jobs progress.

use crate::command::CommandState;
use crate::job::{JobId, JobState};
use serde::{Deserialize, Serialize};

/// Something a UI or headless client may want to react to.
///
/// Events are informational; the job itself remains the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    JobCreated {
        job_id: JobId,
        goal: String,
    },
    CommandStarted {
        job_id: JobId,
        seq: u32,
        command: String,
        is_retry: bool,
    },
    CommandFinished {
        job_id: JobId,
        seq: u32,
        state: CommandState,
        exit_code: Option<i32>,
        summary: Option<String>,
    },
    RetrySubmitted {
        job_id: JobId,
        classification: String,
        seqs: Vec<u32>,
    },
    RetryFailed {
        job_id: JobId,
        error: String,
    },
    JobFinished {
        job_id: JobId,
        state: JobState,
        message: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::JobCreated { job_id, .. }
            | JobEvent::CommandStarted { job_id, .. }
            | JobEvent::CommandFinished { job_id, .. }
            | JobEvent::RetrySubmitted { job_id, .. }
            | JobEvent::RetryFailed { job_id, .. }
            | JobEvent::JobFinished { job_id, .. } => job_id,
        }
    }

    /// Short event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::JobCreated { .. } => "job:created",
            JobEvent::CommandStarted { .. } => "command:started",
            JobEvent::CommandFinished { .. } => "command:finished",
            JobEvent::RetrySubmitted { .. } => "retry:submitted",
            JobEvent::RetryFailed { .. } => "retry:failed",
            JobEvent::JobFinished { .. } => "job:finished",
        }
    }
}
