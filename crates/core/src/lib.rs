// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsh-core: command results, job state, and shared value types for the wsh
//! execution engine.

pub mod macros;

pub mod clock;
pub mod command;
pub mod event;
pub mod host;
pub mod id;
pub mod job;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{
    CommandKey, CommandResult, CommandSpec, CommandState, TerminalOutcome, TransitionError,
};
pub use event::JobEvent;
pub use host::HostDescriptor;
pub use id::short;
pub use job::{Job, JobId, JobState, SharedJob};
