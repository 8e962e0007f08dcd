// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded subprocess execution for collaborator programs.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default bound for an external command generator
pub const GENERATOR_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{description}: failed to spawn: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{description}: {source}")]
    Io {
        description: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{description}: timed out after {timeout:?}")]
    TimedOut { description: String, timeout: Duration },
}

/// Run a command to completion, killing it if it outlives `timeout`.
///
/// `input`, when given, is written to the child's stdin and stdin is closed.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
    input: Option<&[u8]>,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() });

    let mut child = cmd.spawn().map_err(|source| SubprocessError::Spawn {
        description: description.to_string(),
        source,
    })?;

    // Feed stdin while stdout/stderr drain so neither pipe can fill up and
    // stall the child. The timeout covers both, and stdin closes once written.
    let stdin = child.stdin.take();
    let feed = async move {
        let (Some(bytes), Some(mut stdin)) = (input, stdin) else {
            return Ok(());
        };
        match stdin.write_all(bytes).await {
            // The child exited without reading all of its input
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    };
    let run = async {
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        fed.and(output)
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(result) => result.map_err(|source| SubprocessError::Io {
            description: description.to_string(),
            source,
        }),
        Err(_) => {
            tracing::warn!(description, ?timeout, "subprocess timed out");
            Err(SubprocessError::TimedOut { description: description.to_string(), timeout })
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
