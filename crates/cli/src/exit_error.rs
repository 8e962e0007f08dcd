// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination.

use std::fmt;
use wsh_core::JobState;

/// Process exit codes
pub mod codes {
    pub const DONE: i32 = 0;
    pub const FAILED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Bad arguments or configuration
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(codes::USAGE, message)
    }

    pub fn interrupted() -> Self {
        Self::new(codes::INTERRUPTED, "Interrupted; running commands were cancelled.")
    }

    /// Exit for a job that ended in `state`, or `None` when it succeeded
    pub fn for_job(state: JobState, message: &str) -> Option<Self> {
        match state {
            JobState::Done => None,
            JobState::Failed => Some(Self::new(codes::FAILED, message)),
            JobState::Doing => Some(Self::new(codes::FAILED, "Job did not finish.")),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
