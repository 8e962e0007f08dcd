// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-process backend.

use super::classify::{exit_outcome, read_tail};
use super::host::describe_local_host;
use super::{
    apply_transition, not_running_message, signal_registered, ExecutionBackend, Launch, LogSink,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::Instrument;
use wsh_core::{
    Clock, CommandKey, CommandResult, CommandState, HostDescriptor, SharedJob, SystemClock,
    TerminalOutcome,
};

/// Bytes of stderr inspected when classifying a failed exit
const STDERR_TAIL_BYTES: u64 = 4096;

/// Configuration for [`LocalBackend`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Shell used as `<shell> -c <command>`
    pub shell: String,
    /// Wait after SIGTERM before escalating to SIGKILL
    pub cancel_grace_ms: u64,
    /// Wait for the process to be reaped after SIGKILL
    pub kill_wait_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self { shell: "sh".to_string(), cancel_grace_ms: 500, kill_wait_ms: 2_000 }
    }
}

impl LocalConfig {
    wsh_core::setters! {
        into shell: String;
        set cancel_grace_ms: u64;
        set kill_wait_ms: u64;
    }
}

struct RunningCommand {
    job: SharedJob,
    child: Child,
    command: String,
    stderr_path: PathBuf,
    started: Instant,
    timeout_secs: u64,
}

/// Runs commands as local OS processes.
///
/// Each command is spawned in its own process group with stdout/stderr
/// redirected to its log sink. Completion is observed by `poll_running`,
/// which also enforces timeouts by wall-clock time.
pub struct LocalBackend<C: Clock = SystemClock> {
    config: LocalConfig,
    clock: C,
    running: Arc<Mutex<HashMap<CommandKey, RunningCommand>>>,
}

impl LocalBackend<SystemClock> {
    pub fn new(config: LocalConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> LocalBackend<C> {
    pub fn with_clock(config: LocalConfig, clock: C) -> Self {
        Self { config, clock, running: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    fn spawn(&self, command: &str, sink: LogSink) -> std::io::Result<Child> {
        let (stdout, stderr) = sink.into_stdio();
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.spawn()
    }

    fn spawn_failure(&self, error: &std::io::Error) -> TerminalOutcome {
        match error.kind() {
            std::io::ErrorKind::NotFound => TerminalOutcome::command_not_found(&self.config.shell),
            _ => TerminalOutcome::new(CommandState::Others, -1)
                .with_summary(format!("Failed to start {}: {}", self.config.shell, error)),
        }
    }

    fn status_outcome(&self, entry: &RunningCommand, status: ExitStatus) -> TerminalOutcome {
        match status.code() {
            Some(code) => {
                let tail = if code == 0 {
                    String::new()
                } else {
                    read_tail(&entry.stderr_path, STDERR_TAIL_BYTES)
                };
                exit_outcome(&entry.command, code, &tail)
            }
            None => TerminalOutcome::new(CommandState::Others, -1)
                .with_summary(format!("Terminated by signal{}.", signal_suffix(status))),
        }
    }

    /// SIGTERM the process group, wait out the grace period, then SIGKILL.
    async fn terminate(&self, entry: &mut RunningCommand) {
        let grace = Duration::from_millis(self.config.cancel_grace_ms);
        signal_group(&entry.child, GroupSignal::Terminate);
        if tokio::time::timeout(grace, entry.child.wait()).await.is_ok() {
            return;
        }
        tracing::debug!(command = %entry.command, "grace period elapsed, killing");
        signal_group(&entry.child, GroupSignal::Kill);
        let _ = entry.child.start_kill();
        let wait = Duration::from_millis(self.config.kill_wait_ms);
        if tokio::time::timeout(wait, entry.child.wait()).await.is_err() {
            tracing::warn!(command = %entry.command, "process did not exit after SIGKILL");
        }
    }
}

#[async_trait]
impl<C: Clock> ExecutionBackend for LocalBackend<C> {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn start(&self, job: &SharedJob, launch: Launch, sink: LogSink) {
        let Launch { seq, spec, is_retry, registered } = launch;
        let job_id = job.lock().id.clone();
        let span = tracing::info_span!("command.start", %job_id, seq, backend = "local");
        async {
            let started_at_ms = self.clock.epoch_ms();
            let (stdout_path, stderr_path) = sink.paths();
            let result = CommandResult::started(
                seq,
                &spec,
                stdout_path.clone(),
                stderr_path.clone(),
                started_at_ms,
            )
            .with_retry(is_retry);

            match self.spawn(&spec.command, sink) {
                Ok(child) => {
                    let pid = child.id();
                    let entry = RunningCommand {
                        job: Arc::clone(job),
                        child,
                        command: spec.command.clone(),
                        stderr_path,
                        started: self.clock.now(),
                        timeout_secs: spec.timeout_secs,
                    };
                    // Result and in-flight entry appear together: whoever
                    // sees the running result can cancel it.
                    let mut job = job.lock();
                    if let Err(e) = job.insert_result(result) {
                        tracing::warn!(error = %e, "command already recorded, killing duplicate");
                        return;
                    }
                    self.running.lock().insert(CommandKey::new(job_id.clone(), seq), entry);
                    tracing::info!(pid, command = %spec.command, "command started");
                }
                Err(e) => {
                    tracing::error!(error = %e, command = %spec.command, "spawn failed");
                    let mut failed = CommandResult::terminal_at_creation(
                        seq,
                        &spec,
                        self.spawn_failure(&e),
                        started_at_ms,
                    )
                    .with_retry(is_retry);
                    failed.stdout_path = stdout_path;
                    failed.stderr_path = stderr_path;
                    if let Err(e) = job.lock().insert_result(failed) {
                        tracing::warn!(error = %e, "failed to record spawn failure");
                    }
                }
            }
        }
        .instrument(span)
        .await;
        signal_registered(registered);
    }

    async fn poll_running(&self) {
        let mut exited = Vec::new();
        let mut expired = Vec::new();
        {
            let mut running = self.running.lock();
            let keys: Vec<CommandKey> = running.keys().cloned().collect();
            for key in keys {
                let Some(entry) = running.get_mut(&key) else {
                    continue;
                };
                match entry.child.try_wait() {
                    Ok(Some(status)) => {
                        if let Some(entry) = running.remove(&key) {
                            exited.push((key, entry, Ok(status)));
                        }
                    }
                    Ok(None) => {
                        if self.clock.expired(entry.started, entry.timeout_secs) {
                            if let Some(entry) = running.remove(&key) {
                                expired.push((key, entry));
                            }
                        }
                    }
                    Err(e) => {
                        if let Some(entry) = running.remove(&key) {
                            exited.push((key, entry, Err(e)));
                        }
                    }
                }
            }
        }

        for (key, entry, status) in exited {
            let outcome = match status {
                Ok(status) => self.status_outcome(&entry, status),
                Err(e) => TerminalOutcome::new(CommandState::Others, -1)
                    .with_summary(format!("Failed to observe process: {e}")),
            };
            apply_transition(&entry.job, key.seq, outcome, self.clock.epoch_ms());
        }

        for (key, mut entry) in expired {
            tracing::warn!(%key, timeout_secs = entry.timeout_secs, "command timed out");
            self.terminate(&mut entry).await;
            apply_transition(
                &entry.job,
                key.seq,
                TerminalOutcome::timed_out(entry.timeout_secs),
                self.clock.epoch_ms(),
            );
        }
    }

    async fn cancel(&self, key: &CommandKey) -> String {
        let removed = self.running.lock().remove(key);
        let Some(mut entry) = removed else {
            return not_running_message(key);
        };
        tracing::info!(%key, command = %entry.command, "cancelling command");
        self.terminate(&mut entry).await;
        apply_transition(&entry.job, key.seq, TerminalOutcome::user_cancelled(), self.clock.epoch_ms());
        format!("Command {} cancelled.", key.seq)
    }

    async fn describe_host(&self, full_inventory: bool) -> HostDescriptor {
        tokio::task::spawn_blocking(move || describe_local_host(full_inventory))
            .await
            .unwrap_or_else(|e| HostDescriptor::degraded(format!("host probe panicked: {e}")))
    }

    fn in_flight(&self) -> Vec<CommandKey> {
        let mut keys: Vec<CommandKey> = self.running.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: GroupSignal) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    let Some(pid) = child.id() else {
        return;
    };
    let signal = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), signal) {
        tracing::debug!(pid, ?signal, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn signal_group(_child: &Child, _signal: GroupSignal) {}

#[cfg(unix)]
fn signal_suffix(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|s| format!(" {s}")).unwrap_or_default()
}

#[cfg(not(unix))]
fn signal_suffix(_status: ExitStatus) -> String {
    String::new()
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
