// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution backends
//!
//! An [`ExecutionBackend`] runs commands against one execution substrate and
//! owns the set of in-flight commands. Every backend honours the same
//! contract:
//!
//! - `start` records a `Doing` result in the job and never waits for a local
//!   process to finish
//! - whichever caller removes a command from the in-flight set performs its
//!   single terminal transition
//! - internal failures become command states and log content; nothing
//!   escapes the backend boundary as an error
//!
//! ```text
//! Backend ──┬── Local   sh -c <command>, polled with try_wait
//!           └── Remote  request/response against a C2 session
//! ```

mod classify;
mod host;
mod local;
mod remote;
mod sink;

#[cfg(any(test, feature = "test-support"))]
mod fake_session;

pub use classify::{classify_exit, exit_outcome, read_tail};
pub use host::describe_local_host;
pub use local::{LocalBackend, LocalConfig};
pub use remote::{RemoteBackend, RemoteError, RemoteInfo, RemoteOutput, RemoteSession};
pub use sink::{LogSink, SinkError};

#[cfg(any(test, feature = "test-support"))]
pub use fake_session::{FakeRemoteSession, RemoteCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use wsh_core::{CommandKey, CommandSpec, HostDescriptor, SharedJob, TerminalOutcome};

/// Errors that prevent a backend from being constructed.
///
/// Once constructed, backends report per-command failures as command states.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("remote session {0} is dead")]
    SessionDead(String),
    #[error("remote backend configured but no session was provided")]
    NoSession,
    #[error("remote session error: {0}")]
    Remote(#[from] RemoteError),
}

/// One command handed to a backend
#[derive(Debug)]
pub struct Launch {
    /// Sequence number reserved by the executor
    pub seq: u32,
    pub spec: CommandSpec,
    /// Submitted as a replacement for failed commands
    pub is_retry: bool,
    registered: Option<oneshot::Sender<()>>,
}

impl Launch {
    pub fn new(seq: u32, spec: CommandSpec) -> Self {
        Self { seq, spec, is_retry: false, registered: None }
    }

    pub fn retry(mut self, is_retry: bool) -> Self {
        self.is_retry = is_retry;
        self
    }

    /// Resolve `tx` once the command's result is recorded and the command is
    /// tracked in flight. Dropping the launch resolves it as well.
    pub fn notify_registered(mut self, tx: oneshot::Sender<()>) -> Self {
        self.registered = Some(tx);
        self
    }
}

/// Tell the submitter a launch is recorded and tracked
fn signal_registered(registered: Option<oneshot::Sender<()>>) {
    if let Some(tx) = registered {
        // The submitter may have stopped waiting
        let _ = tx.send(());
    }
}

/// Capability set shared by every execution substrate
#[async_trait]
pub trait ExecutionBackend: Send + Sync + 'static {
    /// Short name for logs ("local", "remote")
    fn name(&self) -> &'static str;

    /// Start a command and record it as in flight.
    ///
    /// Start-time failures are recorded directly as terminal results.
    async fn start(&self, job: &SharedJob, launch: Launch, sink: LogSink);

    /// Transition every in-flight command that has finished (or outlived its
    /// timeout). Safe to call repeatedly.
    async fn poll_running(&self);

    /// Terminate an in-flight command, graceful first, then forceful.
    ///
    /// Returns a human-readable outcome; untracked commands are reported as
    /// not running and left untouched.
    async fn cancel(&self, key: &CommandKey) -> String;

    /// Describe the host commands run on. Never fails; errors produce a
    /// degraded descriptor.
    async fn describe_host(&self, full_inventory: bool) -> HostDescriptor;

    /// Snapshot of the in-flight set
    fn in_flight(&self) -> Vec<CommandKey>;
}

/// Message returned when cancelling an untracked command
pub fn not_running_message(key: &CommandKey) -> String {
    format!("Command {} is not running.", key.seq)
}

/// Apply a terminal transition to a job's command, logging instead of failing.
pub(crate) fn apply_transition(job: &SharedJob, seq: u32, outcome: TerminalOutcome, at_ms: u64) {
    let mut job = job.lock();
    let state = outcome.state;
    let exit_code = outcome.exit_code;
    match job.finish_command(seq, outcome, at_ms) {
        Ok(()) => tracing::info!(job_id = %job.id, seq, %state, exit_code, "command finished"),
        Err(e) => tracing::warn!(job_id = %job.id, seq, error = %e, "dropped terminal transition"),
    }
}

/// Backend selection as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Local(LocalConfig),
    Remote {
        /// Extra time allowed beyond a command's own timeout before the
        /// remote call is abandoned
        #[serde(default = "default_remote_slack_ms")]
        timeout_slack_ms: u64,
    },
}

fn default_remote_slack_ms() -> u64 {
    5_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local(LocalConfig::default())
    }
}

/// The execution backends, routed by variant.
///
/// Adding a substrate means adding a variant here; the executor only sees
/// [`ExecutionBackend`].
pub enum Backend {
    Local(LocalBackend),
    Remote(RemoteBackend),
}

impl Backend {
    /// Build the configured backend. Remote backends need a connected session.
    pub async fn from_config(
        config: &BackendConfig,
        session: Option<Arc<dyn RemoteSession>>,
    ) -> Result<Self, BackendError> {
        match config {
            BackendConfig::Local(local) => Ok(Backend::Local(LocalBackend::new(local.clone()))),
            BackendConfig::Remote { timeout_slack_ms } => {
                let session = session.ok_or(BackendError::NoSession)?;
                let backend = RemoteBackend::connect(session)
                    .await?
                    .with_timeout_slack(Duration::from_millis(*timeout_slack_ms));
                Ok(Backend::Remote(backend))
            }
        }
    }
}

#[async_trait]
impl ExecutionBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Local(b) => b.name(),
            Backend::Remote(b) => b.name(),
        }
    }

    async fn start(&self, job: &SharedJob, launch: Launch, sink: LogSink) {
        match self {
            Backend::Local(b) => b.start(job, launch, sink).await,
            Backend::Remote(b) => b.start(job, launch, sink).await,
        }
    }

    async fn poll_running(&self) {
        match self {
            Backend::Local(b) => b.poll_running().await,
            Backend::Remote(b) => b.poll_running().await,
        }
    }

    async fn cancel(&self, key: &CommandKey) -> String {
        match self {
            Backend::Local(b) => b.cancel(key).await,
            Backend::Remote(b) => b.cancel(key).await,
        }
    }

    async fn describe_host(&self, full_inventory: bool) -> HostDescriptor {
        match self {
            Backend::Local(b) => b.describe_host(full_inventory).await,
            Backend::Remote(b) => b.describe_host(full_inventory).await,
        }
    }

    fn in_flight(&self) -> Vec<CommandKey> {
        match self {
            Backend::Local(b) => b.in_flight(),
            Backend::Remote(b) => b.in_flight(),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
