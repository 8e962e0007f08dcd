// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    tty = { false, false, true, true },
    piped = { false, false, false, false },
    forced = { false, true, false, true },
    no_color_beats_force = { true, true, true, false },
)]
fn colorize_decision(no_color: bool, force: bool, tty: bool, expected: bool) {
    assert_eq!(decide(no_color, force, tty), expected);
}

#[test]
fn paint_wraps_in_ansi_256() {
    assert_eq!(paint(codes::HEADER, "foo", true), "\x1b[38;5;74mfoo\x1b[0m");
    assert_eq!(paint(codes::HEADER, "foo", false), "foo");
}

#[parameterized(
    running = { CommandState::Doing, codes::PENDING },
    success = { CommandState::Success, codes::GOOD },
    timeout = { CommandState::Timeout, codes::BAD },
    cancelled = { CommandState::UserCancelled, codes::BAD },
)]
fn command_state_palette(state: CommandState, code: u8) {
    assert_eq!(command_state_code(state), code);
}

#[test]
fn job_state_palette() {
    assert_eq!(job_state_code(JobState::Done), codes::GOOD);
    assert_eq!(job_state_code(JobState::Failed), codes::BAD);
    assert_eq!(job_state_code(JobState::Doing), codes::PENDING);
}
