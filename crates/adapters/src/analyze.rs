// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log analysis collaborator: turns a finished command's logs into a
//! one-line summary.

use crate::backend::read_tail;
use crate::generate::CollaboratorError;
use async_trait::async_trait;
use wsh_core::{CommandResult, CommandState};

/// Verdict of a log analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// The analyzer's view of the outcome. Advisory; the recorded state is
    /// never changed by analysis.
    pub state: CommandState,
    pub summary: String,
}

#[async_trait]
pub trait LogAnalyzer: Send + Sync + 'static {
    async fn analyze(&self, result: &CommandResult) -> Result<Analysis, CollaboratorError>;
}

/// Summarises a command from the tails of its log files
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    tail_bytes: u64,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self { tail_bytes: 2048 }
    }
}

impl HeuristicAnalyzer {
    pub fn new(tail_bytes: u64) -> Self {
        Self { tail_bytes }
    }

    /// Summary for a result given its stdout and stderr tails
    pub fn summarize(result: &CommandResult, stdout_tail: &str, stderr_tail: &str) -> String {
        if result.state == CommandState::Success {
            return match last_line(stdout_tail) {
                Some(line) => format!("Completed successfully. Last output: {line}"),
                None => "Completed successfully with no output.".to_string(),
            };
        }
        let code = result.exit_code.unwrap_or(-1);
        match (last_line(stderr_tail), &result.log_summary) {
            (Some(line), _) => format!("{} (exit {code}): {line}", result.state),
            (None, Some(existing)) => existing.clone(),
            (None, None) => format!("{} (exit {code}).", result.state),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

#[async_trait]
impl LogAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, result: &CommandResult) -> Result<Analysis, CollaboratorError> {
        let stdout_path = result.stdout_path.clone();
        let stderr_path = result.stderr_path.clone();
        let tail_bytes = self.tail_bytes;
        let (stdout_tail, stderr_tail) = tokio::task::spawn_blocking(move || {
            (read_tail(&stdout_path, tail_bytes), read_tail(&stderr_path, tail_bytes))
        })
        .await
        .map_err(|e| CollaboratorError::Unavailable(format!("log read task failed: {e}")))?;

        Ok(Analysis {
            state: result.state,
            summary: Self::summarize(result, &stdout_tail, &stderr_tail),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Analysis, CollaboratorError, LogAnalyzer};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use wsh_core::CommandResult;

    #[derive(Default)]
    struct FakeAnalyzerState {
        errors: HashMap<u32, CollaboratorError>,
        fail_all: Option<CollaboratorError>,
        analyzed: Vec<u32>,
    }

    /// Fake analyzer. Summaries read `analyzed: <command>` unless an error
    /// was configured.
    #[derive(Clone, Default)]
    pub struct FakeAnalyzer {
        inner: Arc<Mutex<FakeAnalyzerState>>,
    }

    impl FakeAnalyzer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_seq(&self, seq: u32, error: CollaboratorError) {
            self.inner.lock().errors.insert(seq, error);
        }

        pub fn fail_all(&self, error: CollaboratorError) {
            self.inner.lock().fail_all = Some(error);
        }

        /// Sequence numbers analyzed, in call order
        pub fn analyzed(&self) -> Vec<u32> {
            self.inner.lock().analyzed.clone()
        }
    }

    #[async_trait]
    impl LogAnalyzer for FakeAnalyzer {
        async fn analyze(&self, result: &CommandResult) -> Result<Analysis, CollaboratorError> {
            let mut inner = self.inner.lock();
            inner.analyzed.push(result.seq);
            if let Some(e) = inner.errors.get(&result.seq).or(inner.fail_all.as_ref()) {
                return Err(e.clone());
            }
            Ok(Analysis { state: result.state, summary: format!("analyzed: {}", result.command) })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAnalyzer;

#[cfg(test)]
#[path = "analyze_tests.rs"]
mod tests;
