// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command::{CommandSpec, CommandState};
use crate::test_support::strategies::*;
use crate::test_support::{job_with_states, test_job};
use proptest::prelude::*;

#[test]
fn job_id_has_prefix() {
    assert!(JobId::new().as_str().starts_with("job-"));
}

#[test]
fn new_job_is_doing_and_empty() {
    let job = test_job("job-1");
    assert_eq!(job.state, JobState::Doing);
    assert!(job.results.is_empty());
    assert_eq!(job.last_seq(), 0);
}

#[test]
fn reserve_seqs_is_one_based_and_monotonic() {
    let mut job = test_job("job-1");
    assert_eq!(job.reserve_seqs(3), vec![1, 2, 3]);
    assert_eq!(job.reserve_seqs(2), vec![4, 5]);
    assert_eq!(job.last_seq(), 5);
    assert_eq!(job.reserve_seq(), 6);
}

#[test]
fn insert_rejects_duplicate_sequence_numbers() {
    let mut job = job_with_states(&[CommandState::Success]);
    let spec = CommandSpec::new("id", 5);
    let dup = CommandResult::started(1, &spec, "a".into(), "b".into(), 0);
    assert_eq!(job.insert_result(dup), Err(TransitionError::Duplicate { seq: 1 }));
}

#[test]
fn finish_unknown_command_is_an_error() {
    let mut job = test_job("job-1");
    let err = job.finish_command(9, TerminalOutcome::user_cancelled(), 0).unwrap_err();
    assert_eq!(err, TransitionError::UnknownCommand { seq: 9 });
}

#[yare::parameterized(
    all_success   = { &[CommandState::Success, CommandState::Success], (true, false) },
    one_failed    = { &[CommandState::Success, CommandState::Timeout], (true, true) },
    still_running = { &[CommandState::Doing, CommandState::Timeout], (false, true) },
    only_running  = { &[CommandState::Doing], (false, false) },
)]
fn is_all_completed_table(states: &[CommandState], expected: (bool, bool)) {
    assert_eq!(job_with_states(states).is_all_completed(), expected);
}

#[test]
fn finalize_sets_done_once() {
    let mut job = job_with_states(&[CommandState::Success]);
    assert!(job.finalize(2_000));
    assert_eq!(job.state, JobState::Done);
    assert_eq!(job.finished_at_ms, Some(2_000));

    assert!(!job.finalize(3_000));
    assert_eq!(job.finished_at_ms, Some(2_000));
}

#[test]
fn finalize_waits_for_running_commands() {
    let mut job = job_with_states(&[CommandState::Success, CommandState::Doing]);
    assert!(!job.finalize(2_000));
    assert_eq!(job.state, JobState::Doing);
    assert!(job.finished_at_ms.is_none());
}

#[test]
fn finalize_marks_failed_when_any_command_failed() {
    let mut job = job_with_states(&[CommandState::Success, CommandState::UserCancelled]);
    assert!(job.finalize(2_000));
    assert_eq!(job.state, JobState::Failed);
}

#[test]
fn failures_since_checkpoint_skips_handled_batches() {
    let mut job = job_with_states(&[CommandState::Timeout, CommandState::Success]);
    assert_eq!(job.failures_since_checkpoint().len(), 1);

    job.advance_checkpoint();
    assert!(job.failures_since_checkpoint().is_empty());

    let spec = CommandSpec::new("retry", 5);
    let seq = job.reserve_seqs(1)[0];
    let mut retry = CommandResult::started(seq, &spec, "a".into(), "b".into(), 0);
    retry.finish(TerminalOutcome::new(CommandState::NetworkError, 7), 1).unwrap();
    job.insert_result(retry).unwrap();

    let failures = job.failures_since_checkpoint();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].seq, 3);
}

#[test]
fn running_seqs_lists_doing_commands() {
    let job = job_with_states(&[CommandState::Doing, CommandState::Success, CommandState::Doing]);
    assert_eq!(job.running_seqs(), vec![1, 3]);
}

#[test]
fn job_serde_roundtrip_preserves_results() {
    let job = job_with_states(&[CommandState::Success, CommandState::FileNotFound]);
    let json = serde_json::to_string(&job).unwrap();
    let parsed: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.results, job.results);
    assert_eq!(parsed.last_seq(), 2);
}

proptest! {
    #[test]
    fn is_all_completed_matches_definition(states in proptest::collection::vec(arb_command_state(), 1..12)) {
        let (all_done, any_failed) = job_with_states(&states).is_all_completed();
        prop_assert_eq!(all_done, states.iter().all(|s| s.is_terminal()));
        prop_assert_eq!(any_failed, states.iter().any(|s| s.is_failure()));
        if all_done && !any_failed {
            prop_assert!(states.iter().all(|s| *s == CommandState::Success));
        }
    }
}
