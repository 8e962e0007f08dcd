// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsh-engine: runs generated commands through a backend, tracks them to
//! completion and drives the retry loop.
//!
//! ```text
//! Engagement ─┬─ CommandExecutor ── ExecutionBackend
//!             ├─ StatusTracker ──── JobStore
//!             └─ RetryCoordinator ─ CommandGenerator
//! ```

mod config;
mod engagement;
mod error;
mod executor;
mod retry;
mod tracker;

pub use config::EngineConfig;
pub use engagement::{Engagement, EngagementDeps};
pub use error::EngineError;
pub use executor::CommandExecutor;
pub use retry::{classify_failures, RetryCoordinator, RetryOutcome};
pub use tracker::{completion_message, StatusTracker, TrackerError};
