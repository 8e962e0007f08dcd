// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs: one user goal and the commands executed for it.

use crate::command::{CommandResult, TerminalOutcome, TransitionError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub use crate::id::JobId;

/// Aggregate state of a job, derived from its command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Doing,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Doing)
    }
}

crate::simple_display! {
    JobState {
        Doing => "doing",
        Done => "done",
        Failed => "failed",
    }
}

/// A job shared between the engagement and the backend running its commands.
///
/// Never hold the lock across an `.await`.
pub type SharedJob = Arc<Mutex<Job>>;

/// A user goal and its ordered command history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub goal: String,
    pub state: JobState,
    /// Command results keyed by sequence number
    pub results: BTreeMap<u32, CommandResult>,
    pub created_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    /// Directory holding this job's per-command log files
    pub log_dir: PathBuf,
    /// Retry batches submitted so far
    #[serde(default)]
    pub retry_count: u32,
    /// Highest sequence number whose failures were already handed to the
    /// retry coordinator
    #[serde(default)]
    pub checkpoint: u32,
    /// Extra context passed to the command generator
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    next_seq: u32,
}

impl Job {
    pub fn new(goal: impl Into<String>, log_dir: PathBuf, created_at_ms: u64) -> Self {
        Self::with_id(JobId::new(), goal, log_dir, created_at_ms)
    }

    pub fn with_id(
        id: JobId,
        goal: impl Into<String>,
        log_dir: PathBuf,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            goal: goal.into(),
            state: JobState::Doing,
            results: BTreeMap::new(),
            created_at_ms,
            finished_at_ms: None,
            log_dir,
            retry_count: 0,
            checkpoint: 0,
            context: BTreeMap::new(),
            next_seq: 1,
        }
    }

    pub fn into_shared(self) -> SharedJob {
        Arc::new(Mutex::new(self))
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Reserve the next sequence number
    pub fn reserve_seq(&mut self) -> u32 {
        let seq = self.next_seq.max(1);
        self.next_seq = seq + 1;
        seq
    }

    /// Reserve `n` consecutive sequence numbers in submission order
    pub fn reserve_seqs(&mut self, n: usize) -> Vec<u32> {
        (0..n).map(|_| self.reserve_seq()).collect()
    }

    /// Highest sequence number handed out so far (0 if none)
    pub fn last_seq(&self) -> u32 {
        self.next_seq.max(1) - 1
    }

    /// Record a new command result. Sequence numbers are never reused.
    pub fn insert_result(&mut self, result: CommandResult) -> Result<(), TransitionError> {
        if self.results.contains_key(&result.seq) {
            return Err(TransitionError::Duplicate { seq: result.seq });
        }
        self.next_seq = self.next_seq.max(result.seq + 1);
        self.results.insert(result.seq, result);
        Ok(())
    }

    pub fn result(&self, seq: u32) -> Option<&CommandResult> {
        self.results.get(&seq)
    }

    pub fn result_mut(&mut self, seq: u32) -> Option<&mut CommandResult> {
        self.results.get_mut(&seq)
    }

    /// Apply the terminal transition for one command
    pub fn finish_command(
        &mut self,
        seq: u32,
        outcome: TerminalOutcome,
        at_ms: u64,
    ) -> Result<(), TransitionError> {
        self.results
            .get_mut(&seq)
            .ok_or(TransitionError::UnknownCommand { seq })?
            .finish(outcome, at_ms)
    }

    /// `(all_done, any_failed)` over every command result.
    ///
    /// `all_done` is false while any result is `Doing`; `any_failed` is true
    /// when any terminal result is not `Success`.
    pub fn is_all_completed(&self) -> (bool, bool) {
        let mut all_done = true;
        let mut any_failed = false;
        for result in self.results.values() {
            if result.is_terminal() {
                any_failed |= result.state.is_failure();
            } else {
                all_done = false;
            }
        }
        (all_done, any_failed)
    }

    /// Sequence numbers still running
    pub fn running_seqs(&self) -> Vec<u32> {
        self.results
            .values()
            .filter(|r| !r.is_terminal())
            .map(|r| r.seq)
            .collect()
    }

    /// Terminal failures newer than the retry checkpoint
    pub fn failures_since_checkpoint(&self) -> Vec<&CommandResult> {
        self.results
            .range(self.checkpoint + 1..)
            .map(|(_, r)| r)
            .filter(|r| r.state.is_failure())
            .collect()
    }

    /// Mark every command submitted so far as handed to the retry coordinator
    pub fn advance_checkpoint(&mut self) {
        self.checkpoint = self.last_seq();
    }

    /// Move to DONE/FAILED if every command is terminal.
    ///
    /// Returns true only on the call that changes the state.
    pub fn finalize(&mut self, at_ms: u64) -> bool {
        if self.is_terminal() {
            return false;
        }
        let (all_done, any_failed) = self.is_all_completed();
        if !all_done {
            return false;
        }
        self.state = if any_failed { JobState::Failed } else { JobState::Done };
        self.finished_at_ms = Some(at_ms);
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
