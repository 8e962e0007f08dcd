// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{CommandResult, CommandSpec, CommandState, Job, JobId, TerminalOutcome};
use std::path::PathBuf;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::CommandState;
    use proptest::prelude::*;

    pub fn arb_terminal_state() -> impl Strategy<Value = CommandState> {
        prop_oneof![
            Just(CommandState::Success),
            Just(CommandState::Timeout),
            Just(CommandState::NetworkError),
            Just(CommandState::CommandNotFound),
            Just(CommandState::FileNotFound),
            Just(CommandState::RemoteOperationFailed),
            Just(CommandState::UserCancelled),
            Just(CommandState::Others),
            Just(CommandState::ApiError),
        ]
    }

    pub fn arb_command_state() -> impl Strategy<Value = CommandState> {
        prop_oneof![1 => Just(CommandState::Doing), 4 => arb_terminal_state()]
    }
}

// ── Factories ───────────────────────────────────────────────────────────

pub fn test_job(id: &str) -> Job {
    Job::with_id(JobId::from(id), "enumerate the target", PathBuf::from("/tmp/wsh-test"), 1_000_000)
}

/// A job holding one result per state, sequence numbers starting at 1
pub fn job_with_states(states: &[CommandState]) -> Job {
    let mut job = test_job("job-test");
    for (seq, state) in job.reserve_seqs(states.len()).into_iter().zip(states) {
        let spec = CommandSpec::new(format!("cmd-{seq}"), 30);
        let mut result = CommandResult::started(
            seq,
            &spec,
            PathBuf::from(format!("/tmp/wsh-test/{seq}.stdout.log")),
            PathBuf::from(format!("/tmp/wsh-test/{seq}.stderr.log")),
            1_000_000,
        );
        if state.is_terminal() {
            let code = if *state == CommandState::Success { 0 } else { 1 };
            let _ = result.finish(TerminalOutcome::new(*state, code), 1_000_500);
        }
        let _ = job.insert_result(result);
    }
    job
}
