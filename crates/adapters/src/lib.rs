// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsh-adapters: execution backends and the external collaborators the
//! engine talks to.

pub mod analyze;
pub mod backend;
pub mod generate;
pub mod subprocess;

pub use analyze::{Analysis, HeuristicAnalyzer, LogAnalyzer};
pub use backend::{
    Backend, BackendConfig, BackendError, ExecutionBackend, Launch, LocalBackend, LocalConfig,
    LogSink, RemoteBackend, RemoteError, RemoteInfo, RemoteOutput, RemoteSession, SinkError,
};
pub use generate::{
    CollaboratorError, CommandGenerator, ExternalGenerator, FailureClass, FailureSummary,
    GenerateRequest, StaticGenerator,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use analyze::FakeAnalyzer;
#[cfg(any(test, feature = "test-support"))]
pub use backend::{FakeRemoteSession, RemoteCall};
#[cfg(any(test, feature = "test-support"))]
pub use generate::FakeGenerator;
