// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-session backend.
//!
//! Commands run through an established command-and-control session. The
//! session's wire protocol lives elsewhere; this backend only consumes the
//! [`RemoteSession`] request/response interface.

use super::classify::exit_outcome;
use super::{
    apply_transition, not_running_message, signal_registered, BackendError, ExecutionBackend, Launch,
    LogSink,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use wsh_core::{
    Clock, CommandKey, CommandResult, CommandState, HostDescriptor, SharedJob, SystemClock,
    TerminalOutcome,
};

/// Bytes of remote stderr inspected when classifying a failed exit
const STDERR_TAIL_BYTES: usize = 4096;

/// Longest `cancel` waits for `start` to release the command's log sink
const SINK_RELEASE_WAIT: Duration = Duration::from_millis(500);

/// Default allowance past a command's timeout before the call is abandoned
pub const DEFAULT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Errors reported by a remote session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote call timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("remote operation failed: {0}")]
    Operation(String),
    #[error("session is dead")]
    SessionDead,
}

/// Captured output of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

/// Identity of the machine behind a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInfo {
    pub os: String,
    pub arch: String,
    pub hostname: String,
    pub username: String,
}

/// An established command-and-control session
#[async_trait]
pub trait RemoteSession: Send + Sync + 'static {
    /// Session identifier for logs
    fn id(&self) -> &str;

    async fn is_dead(&self) -> bool;

    /// Run a command and wait for its output. `timeout` of zero means the
    /// session applies no limit.
    async fn execute(&self, command: &str, timeout: Duration) -> Result<RemoteOutput, RemoteError>;

    async fn info(&self) -> Result<RemoteInfo, RemoteError>;

    async fn list_executables(&self) -> Result<Vec<String>, RemoteError>;
}

struct RemoteCommand {
    job: SharedJob,
    token: CancellationToken,
    command: String,
    /// Resolves once `start` has dropped the command's log sink
    sink_released: oneshot::Receiver<()>,
}

/// Runs commands through a [`RemoteSession`].
///
/// `start` awaits the remote response, so the executor runs starts
/// concurrently. Cancellation fires the command's token; whichever of
/// `start` and `cancel` removes the in-flight entry performs the transition,
/// and `cancel` transitions only after `start` has released the log sink.
pub struct RemoteBackend<C: Clock = SystemClock> {
    session: Arc<dyn RemoteSession>,
    clock: C,
    timeout_slack: Duration,
    running: Arc<Mutex<HashMap<CommandKey, RemoteCommand>>>,
}

impl RemoteBackend<SystemClock> {
    /// Wrap a live session. A dead session is a fatal startup condition.
    pub async fn connect(session: Arc<dyn RemoteSession>) -> Result<Self, BackendError> {
        Self::connect_with_clock(session, SystemClock).await
    }
}

impl<C: Clock> RemoteBackend<C> {
    pub async fn connect_with_clock(
        session: Arc<dyn RemoteSession>,
        clock: C,
    ) -> Result<Self, BackendError> {
        if session.is_dead().await {
            return Err(BackendError::SessionDead(session.id().to_string()));
        }
        tracing::info!(session = session.id(), "remote session attached");
        Ok(Self {
            session,
            clock,
            timeout_slack: DEFAULT_TIMEOUT_SLACK,
            running: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn with_timeout_slack(mut self, slack: Duration) -> Self {
        self.timeout_slack = slack;
        self
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    async fn call(&self, command: &str, timeout_secs: u64) -> Result<RemoteOutput, RemoteError> {
        let timeout = Duration::from_secs(timeout_secs);
        if timeout_secs == 0 {
            return self.session.execute(command, timeout).await;
        }
        tokio::time::timeout(timeout + self.timeout_slack, self.session.execute(command, timeout))
            .await
            .unwrap_or(Err(RemoteError::Timeout))
    }
}

fn error_outcome(error: &RemoteError, timeout_secs: u64) -> TerminalOutcome {
    match error {
        RemoteError::Timeout => TerminalOutcome::timed_out(timeout_secs),
        RemoteError::Network(msg) => TerminalOutcome::new(CommandState::NetworkError, -1)
            .with_summary(format!("Network error: {msg}")),
        RemoteError::Operation(msg) => TerminalOutcome::new(CommandState::RemoteOperationFailed, -1)
            .with_summary(format!("Remote operation failed: {msg}")),
        RemoteError::SessionDead => TerminalOutcome::new(CommandState::RemoteOperationFailed, -1)
            .with_summary("Remote session is dead."),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).into_owned()
}

#[async_trait]
impl<C: Clock> ExecutionBackend for RemoteBackend<C> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn start(&self, job: &SharedJob, launch: Launch, sink: LogSink) {
        let Launch { seq, spec, is_retry, registered } = launch;
        let job_id = job.lock().id.clone();
        let key = CommandKey::new(job_id.clone(), seq);
        let span = tracing::info_span!(
            "command.start",
            %job_id,
            seq,
            backend = "remote",
            session = self.session.id()
        );
        async {
            let (stdout_path, stderr_path) = sink.paths();
            let result = CommandResult::started(
                seq,
                &spec,
                stdout_path,
                stderr_path,
                self.clock.epoch_ms(),
            )
            .with_retry(is_retry);

            let token = CancellationToken::new();
            let (released_tx, released_rx) = oneshot::channel();
            {
                let mut recorded = job.lock();
                if let Err(e) = recorded.insert_result(result) {
                    tracing::warn!(error = %e, "command already recorded, not sending");
                    return;
                }
                self.running.lock().insert(
                    key.clone(),
                    RemoteCommand {
                        job: Arc::clone(job),
                        token: token.clone(),
                        command: spec.command.clone(),
                        sink_released: released_rx,
                    },
                );
            }
            signal_registered(registered);
            tracing::info!(command = %spec.command, "remote command sent");

            let sent = Instant::now();
            let response = tokio::select! {
                _ = token.cancelled() => {
                    drop(sink);
                    let _ = released_tx.send(());
                    tracing::debug!("remote command abandoned after cancel");
                    return;
                }
                response = self.call(&spec.command, spec.timeout_secs) => response,
            };

            let owned = self.running.lock().remove(&key);
            if owned.is_none() {
                drop(sink);
                let _ = released_tx.send(());
                tracing::debug!("response arrived after cancel, discarding");
                return;
            }

            let elapsed_ms = sent.elapsed().as_millis() as u64;
            let outcome = match response {
                Ok(output) => {
                    tracing::debug!(exit_code = output.exit_code, elapsed_ms, "remote response");
                    let tail = stderr_tail(&output.stderr);
                    if let Err(e) = sink.write_output(&output.stdout, &output.stderr) {
                        tracing::warn!(error = %e, "failed to write remote output");
                    }
                    exit_outcome(&spec.command, output.exit_code, &tail)
                }
                Err(e) => {
                    tracing::warn!(error = %e, elapsed_ms, "remote command failed");
                    if let Err(write_err) = sink.write_output(b"", e.to_string().as_bytes()) {
                        tracing::warn!(error = %write_err, "failed to write remote error");
                    }
                    error_outcome(&e, spec.timeout_secs)
                }
            };
            apply_transition(job, seq, outcome, self.clock.epoch_ms());
        }
        .instrument(span)
        .await
    }

    async fn poll_running(&self) {}

    async fn cancel(&self, key: &CommandKey) -> String {
        let removed = self.running.lock().remove(key);
        let Some(entry) = removed else {
            return not_running_message(key);
        };
        tracing::info!(%key, command = %entry.command, "cancelling remote command");
        entry.token.cancel();
        if tokio::time::timeout(SINK_RELEASE_WAIT, entry.sink_released).await.is_err() {
            tracing::warn!(%key, "log sink still open after cancel");
        }
        apply_transition(&entry.job, key.seq, TerminalOutcome::user_cancelled(), self.clock.epoch_ms());
        format!("Command {} cancelled.", key.seq)
    }

    async fn describe_host(&self, full_inventory: bool) -> HostDescriptor {
        let info = match self.session.info().await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(session = self.session.id(), error = %e, "remote info failed");
                return HostDescriptor::degraded(format!("remote info failed: {e}"));
            }
        };
        let mut host = HostDescriptor {
            os: info.os,
            arch: info.arch,
            hostname: info.hostname,
            user: info.username,
            inventory: Vec::new(),
            error: None,
        };
        if full_inventory {
            match self.session.list_executables().await {
                Ok(names) => {
                    let unique: BTreeSet<String> = names.into_iter().collect();
                    host.inventory = unique.into_iter().collect();
                }
                Err(e) => host.error = Some(format!("inventory unavailable: {e}")),
            }
        }
        host
    }

    fn in_flight(&self) -> Vec<CommandKey> {
        let mut keys: Vec<CommandKey> = self.running.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
