// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command results and their terminal-transition state machine.
//!
//! A [`CommandResult`] is created in [`CommandState::Doing`] when a command is
//! handed to a backend and moves to exactly one terminal state. The transition
//! stamps `finished_at_ms` and `exit_code` together; a second transition is
//! rejected.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lifecycle state of one executed command. Everything but `Doing` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandState {
    Doing,
    Success,
    Timeout,
    NetworkError,
    CommandNotFound,
    FileNotFound,
    RemoteOperationFailed,
    UserCancelled,
    /// Uncategorized failure
    Others,
    /// The generation or analysis collaborator itself failed
    ApiError,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CommandState::Doing)
    }

    /// Terminal and not a success
    pub fn is_failure(self) -> bool {
        self.is_terminal() && self != CommandState::Success
    }
}

crate::simple_display! {
    CommandState {
        Doing => "doing",
        Success => "success",
        Timeout => "timeout",
        NetworkError => "network_error",
        CommandNotFound => "command_not_found",
        FileNotFound => "file_not_found",
        RemoteOperationFailed => "remote_operation_failed",
        UserCancelled => "user_cancelled",
        Others => "others",
        ApiError => "api_error",
    }
}

/// Identifies a command across every job sharing a backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandKey {
    pub job_id: JobId,
    pub seq: u32,
}

impl CommandKey {
    pub fn new(job_id: JobId, seq: u32) -> Self {
        Self { job_id, seq }
    }
}

impl std::fmt::Display for CommandKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.job_id, self.seq)
    }
}

/// A command to execute, as produced by the generation collaborator or the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
    /// Free-form tool tag, e.g. "shell" or the name of an attack tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            timeout_secs,
            tool: None,
            params: BTreeMap::new(),
            explanation: None,
        }
    }

    crate::setters! {
        set params: BTreeMap<String, String>;
        option tool: String;
        option explanation: String;
    }
}

/// The facts recorded by a terminal transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutcome {
    pub state: CommandState,
    pub exit_code: i32,
    /// Synthetic summary used until the log analyzer provides a better one
    pub summary: Option<String>,
}

impl TerminalOutcome {
    pub fn new(state: CommandState, exit_code: i32) -> Self {
        Self { state, exit_code, summary: None }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn user_cancelled() -> Self {
        Self::new(CommandState::UserCancelled, -1).with_summary("Cancelled by user.")
    }

    pub fn timed_out(timeout_secs: u64) -> Self {
        Self::new(CommandState::Timeout, -1)
            .with_summary(format!("Timed out after {timeout_secs}s."))
    }

    pub fn command_not_found(command: &str) -> Self {
        Self::new(CommandState::CommandNotFound, 127)
            .with_summary(format!("Command not found: {command}"))
    }
}

/// Errors from attempting a state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("command {seq} already finished as {state}")]
    AlreadyTerminal { seq: u32, state: CommandState },
    #[error("command {seq} cannot transition to non-terminal state")]
    NotTerminal { seq: u32 },
    #[error("command {seq} not found")]
    UnknownCommand { seq: u32 },
    #[error("command {seq} already recorded")]
    Duplicate { seq: u32 },
}

/// Record of one executed command's lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub seq: u32,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    pub exit_code: Option<i32>,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    pub timeout_secs: u64,
    pub state: CommandState,
    pub log_summary: Option<String>,
    /// Submitted by the retry coordinator as a replacement
    #[serde(default)]
    pub is_retry: bool,
    /// The log analyzer has replaced the synthetic summary
    #[serde(default)]
    pub analyzed: bool,
    /// Terminal from creation: the command never ran
    #[serde(default)]
    pub start_failed: bool,
}

impl CommandResult {
    /// A freshly started command in `Doing`
    pub fn started(
        seq: u32,
        spec: &CommandSpec,
        stdout_path: PathBuf,
        stderr_path: PathBuf,
        started_at_ms: u64,
    ) -> Self {
        Self {
            seq,
            command: spec.command.clone(),
            tool: spec.tool.clone(),
            params: spec.params.clone(),
            explanation: spec.explanation.clone(),
            started_at_ms,
            finished_at_ms: None,
            exit_code: None,
            stdout_path,
            stderr_path,
            timeout_secs: spec.timeout_secs,
            state: CommandState::Doing,
            log_summary: None,
            is_retry: false,
            analyzed: false,
            start_failed: false,
        }
    }

    /// A result that is terminal from the moment it is created.
    ///
    /// Used for start-time failures and collaborator errors, which never
    /// enter the in-flight set.
    pub fn terminal_at_creation(
        seq: u32,
        spec: &CommandSpec,
        outcome: TerminalOutcome,
        at_ms: u64,
    ) -> Self {
        let mut result = Self::started(seq, spec, PathBuf::new(), PathBuf::new(), at_ms);
        result.state = outcome.state;
        result.exit_code = Some(outcome.exit_code);
        result.finished_at_ms = Some(at_ms);
        result.log_summary = outcome.summary;
        result.start_failed = true;
        result
    }

    pub fn with_retry(mut self, is_retry: bool) -> Self {
        self.is_retry = is_retry;
        self
    }

    pub fn key(&self, job_id: &JobId) -> CommandKey {
        CommandKey::new(job_id.clone(), self.seq)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// A runtime failure worth asking the generator to replace.
    ///
    /// Start failures, user cancellations and collaborator errors are final.
    pub fn is_retry_eligible(&self) -> bool {
        self.state.is_failure()
            && !self.start_failed
            && !matches!(self.state, CommandState::UserCancelled | CommandState::ApiError)
    }

    /// Perform the single terminal transition.
    pub fn finish(&mut self, outcome: TerminalOutcome, at_ms: u64) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::AlreadyTerminal { seq: self.seq, state: self.state });
        }
        if !outcome.state.is_terminal() {
            return Err(TransitionError::NotTerminal { seq: self.seq });
        }
        self.state = outcome.state;
        self.exit_code = Some(outcome.exit_code);
        self.finished_at_ms = Some(at_ms);
        if self.log_summary.is_none() {
            self.log_summary = outcome.summary;
        }
        Ok(())
    }

    /// Replace the synthetic summary with the analyzer's, once.
    ///
    /// Returns false if the command is still running or was already analyzed.
    pub fn record_analysis(&mut self, summary: impl Into<String>) -> bool {
        if !self.is_terminal() || self.analyzed {
            return false;
        }
        self.log_summary = Some(summary.into());
        self.analyzed = true;
        true
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.finished_at_ms.map(|f| f.saturating_sub(self.started_at_ms))
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
