// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::tracker::TrackerError;
use thiserror::Error;
use wsh_core::JobId;

/// Errors surfaced by the engagement façade.
///
/// Command failures are never errors; they are recorded as command states.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create log directory for {job_id}: {source}")]
    LogDir {
        job_id: JobId,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown job: {0}")]
    UnknownJob(String),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
