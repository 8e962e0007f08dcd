// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command generation collaborator.
//!
//! The engine never decides what to run. It hands a goal (and, on retry,
//! the failures so far) to a [`CommandGenerator`] and executes whatever comes
//! back.

use crate::subprocess::{run_with_timeout, SubprocessError, GENERATOR_TIMEOUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use wsh_core::{CommandSpec, CommandState};

/// Timeout given to generated commands that do not specify one
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Errors from an external collaborator (generator or analyzer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("invalid collaborator response: {0}")]
    InvalidResponse(String),
    #[error("collaborator timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<SubprocessError> for CollaboratorError {
    fn from(e: SubprocessError) -> Self {
        match e {
            SubprocessError::TimedOut { timeout, .. } => CollaboratorError::TimedOut(timeout),
            other => CollaboratorError::Unavailable(other.to_string()),
        }
    }
}

/// Coarse characterisation of why commands failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureClass {
    Timeout,
    NetworkError,
    Other,
}

impl FailureClass {
    pub fn of(state: CommandState) -> Self {
        match state {
            CommandState::Timeout => FailureClass::Timeout,
            CommandState::NetworkError => FailureClass::NetworkError,
            _ => FailureClass::Other,
        }
    }
}

wsh_core::simple_display! {
    FailureClass {
        Timeout => "timeout",
        NetworkError => "network_error",
        Other => "other",
    }
}

/// One failed command as reported to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub seq: u32,
    pub command: String,
    pub state: CommandState,
    pub classification: FailureClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_summary: Option<String>,
}

/// Input to [`CommandGenerator::generate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub goal: String,
    /// Failures being retried; empty for the initial plan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prior_failures: Vec<FailureSummary>,
    /// Classification of the whole failure batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FailureClass>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl GenerateRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self { goal: goal.into(), ..Self::default() }
    }

    pub fn is_retry(&self) -> bool {
        !self.prior_failures.is_empty()
    }
}

/// Produces commands for a goal
#[async_trait]
pub trait CommandGenerator: Send + Sync + 'static {
    async fn generate(&self, request: &GenerateRequest)
        -> Result<Vec<CommandSpec>, CollaboratorError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratorResponse {
    List(Vec<GeneratedCommand>),
    Wrapped { commands: Vec<GeneratedCommand> },
}

#[derive(Deserialize)]
struct GeneratedCommand {
    command: String,
    #[serde(default, alias = "timeout_secs")]
    timeout: Option<u64>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    params: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parse a generator's stdout.
///
/// Accepts a bare JSON array of commands or an object with a `commands`
/// array. An empty list is valid (no replacement).
pub fn parse_commands(
    raw: &[u8],
    default_timeout_secs: u64,
) -> Result<Vec<CommandSpec>, CollaboratorError> {
    let response: GeneratorResponse = serde_json::from_slice(raw)
        .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
    let commands = match response {
        GeneratorResponse::List(commands) | GeneratorResponse::Wrapped { commands } => commands,
    };

    commands
        .into_iter()
        .enumerate()
        .map(|(i, generated)| {
            if generated.command.trim().is_empty() {
                return Err(CollaboratorError::InvalidResponse(format!(
                    "command {} is empty",
                    i + 1
                )));
            }
            let params = generated
                .params
                .into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => (k, s),
                    other => (k, other.to_string()),
                })
                .collect();
            let mut spec = CommandSpec::new(
                generated.command,
                generated.timeout.unwrap_or(default_timeout_secs),
            )
            .params(params);
            spec.tool = generated.tool;
            spec.explanation = generated.explanation;
            Ok(spec)
        })
        .collect()
}

/// Generator backed by an external program.
///
/// The request is written to the program's stdin as JSON; the program
/// prints the commands to stdout.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    default_timeout_secs: u64,
}

impl ExternalGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: GENERATOR_TIMEOUT,
            default_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }

    wsh_core::setters! {
        set args: Vec<String>;
        set timeout: Duration;
        set default_timeout_secs: u64;
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

#[async_trait]
impl CommandGenerator for ExternalGenerator {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<CommandSpec>, CollaboratorError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| CollaboratorError::Unavailable(format!("encode request: {e}")))?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let description = format!("generator {}", self.program.display());
        let started = std::time::Instant::now();
        let output = run_with_timeout(cmd, self.timeout, &description, Some(&input)).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            tracing::warn!(%description, status = %output.status, elapsed_ms, "generator failed");
            return Err(CollaboratorError::Unavailable(format!(
                "{description} exited with {}: {}",
                output.status,
                reason.trim()
            )));
        }

        let specs = parse_commands(&output.stdout, self.default_timeout_secs)?;
        tracing::info!(
            %description,
            count = specs.len(),
            retry = request.is_retry(),
            elapsed_ms,
            "generator returned commands"
        );
        Ok(specs)
    }
}

/// Generator that hands out a fixed command list for the initial plan and
/// nothing on retry.
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    commands: Vec<CommandSpec>,
}

impl StaticGenerator {
    pub fn new(commands: Vec<CommandSpec>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl CommandGenerator for StaticGenerator {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<CommandSpec>, CollaboratorError> {
        if request.is_retry() {
            return Ok(Vec::new());
        }
        Ok(self.commands.clone())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CollaboratorError, CommandGenerator, GenerateRequest};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use wsh_core::CommandSpec;

    #[derive(Default)]
    struct FakeGeneratorState {
        responses: VecDeque<Result<Vec<CommandSpec>, CollaboratorError>>,
        requests: Vec<GenerateRequest>,
    }

    /// Fake generator answering from a queue. An empty queue yields no commands.
    #[derive(Clone, Default)]
    pub struct FakeGenerator {
        inner: Arc<Mutex<FakeGeneratorState>>,
    }

    impl FakeGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, response: Result<Vec<CommandSpec>, CollaboratorError>) {
            self.inner.lock().responses.push_back(response);
        }

        /// Queue a response of commands with the given timeout
        pub fn push_commands(&self, commands: &[&str], timeout_secs: u64) {
            self.push(Ok(commands.iter().map(|c| CommandSpec::new(*c, timeout_secs)).collect()));
        }

        pub fn requests(&self) -> Vec<GenerateRequest> {
            self.inner.lock().requests.clone()
        }
    }

    #[async_trait]
    impl CommandGenerator for FakeGenerator {
        async fn generate(
            &self,
            request: &GenerateRequest,
        ) -> Result<Vec<CommandSpec>, CollaboratorError> {
            let mut inner = self.inner.lock();
            inner.requests.push(request.clone());
            inner.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeGenerator;

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
