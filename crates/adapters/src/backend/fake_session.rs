// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted remote session for tests

use super::remote::{RemoteError, RemoteInfo, RemoteOutput, RemoteSession};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Recorded call to a [`FakeRemoteSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Execute { command: String, timeout: Duration },
    Info,
    ListExecutables,
}

struct FakeSessionState {
    dead: bool,
    /// Responses keyed by exact command text, consumed in order
    scripted: HashMap<String, VecDeque<Result<RemoteOutput, RemoteError>>>,
    /// Delay before answering, keyed by command text
    delays: HashMap<String, Duration>,
    info: Result<RemoteInfo, RemoteError>,
    executables: Result<Vec<String>, RemoteError>,
    calls: Vec<RemoteCall>,
}

/// Fake remote session.
///
/// Unscripted commands succeed with empty output.
#[derive(Clone)]
pub struct FakeRemoteSession {
    id: String,
    inner: Arc<Mutex<FakeSessionState>>,
}

impl Default for FakeRemoteSession {
    fn default() -> Self {
        Self::new("session-fake")
    }
}

impl FakeRemoteSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner: Arc::new(Mutex::new(FakeSessionState {
                dead: false,
                scripted: HashMap::new(),
                delays: HashMap::new(),
                info: Ok(RemoteInfo {
                    os: "linux".to_string(),
                    arch: "x86_64".to_string(),
                    hostname: "target".to_string(),
                    username: "www-data".to_string(),
                }),
                executables: Ok(Vec::new()),
                calls: Vec::new(),
            })),
        }
    }

    pub fn set_dead(&self, dead: bool) {
        self.inner.lock().dead = dead;
    }

    /// Queue a response for `command`
    pub fn respond(&self, command: &str, response: Result<RemoteOutput, RemoteError>) {
        self.inner.lock().scripted.entry(command.to_string()).or_default().push_back(response);
    }

    /// Queue a successful response with the given exit code and output
    pub fn respond_output(&self, command: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.respond(
            command,
            Ok(RemoteOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
                exit_code,
            }),
        );
    }

    /// Hold the response for `command` for `delay`
    pub fn delay(&self, command: &str, delay: Duration) {
        self.inner.lock().delays.insert(command.to_string(), delay);
    }

    pub fn set_info(&self, info: Result<RemoteInfo, RemoteError>) {
        self.inner.lock().info = info;
    }

    pub fn set_executables(&self, executables: Result<Vec<String>, RemoteError>) {
        self.inner.lock().executables = executables;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands sent through `execute`, in call order
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RemoteCall::Execute { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RemoteSession for FakeRemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn is_dead(&self) -> bool {
        self.inner.lock().dead
    }

    async fn execute(&self, command: &str, timeout: Duration) -> Result<RemoteOutput, RemoteError> {
        let (delay, response) = {
            let mut inner = self.inner.lock();
            inner.calls.push(RemoteCall::Execute { command: command.to_string(), timeout });
            if inner.dead {
                return Err(RemoteError::SessionDead);
            }
            let delay = inner.delays.get(command).copied();
            let response = inner
                .scripted
                .get_mut(command)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(RemoteOutput::default()));
            (delay, response)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn info(&self) -> Result<RemoteInfo, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Info);
        inner.info.clone()
    }

    async fn list_executables(&self) -> Result<Vec<String>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::ListExecutables);
        inner.executables.clone()
    }
}
