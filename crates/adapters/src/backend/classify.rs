// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit-code and stderr classification shared by both backends.

use regex::RegexSet;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::OnceLock;
use wsh_core::{CommandState, TerminalOutcome};

/// Shell exit status for "command not found"
const EXIT_NOT_FOUND: i32 = 127;
/// Shell exit status for "found but not executable"
const EXIT_NOT_EXECUTABLE: i32 = 126;

fn network_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?i)connection refused",
            r"(?i)network is unreachable",
            r"(?i)no route to host",
            r"(?i)could not resolve host",
            r"(?i)name or service not known",
            r"(?i)temporary failure in name resolution",
            r"(?i)connection timed out",
            r"(?i)connection reset by peer",
        ])
        .unwrap_or_else(|_| RegexSet::empty())
    })
}

fn not_found_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([r"(?i)command not found", r": not found$", r"(?m): not found\s*$"])
            .unwrap_or_else(|_| RegexSet::empty())
    })
}

/// Map a process exit code plus the tail of its stderr to a command state
pub fn classify_exit(exit_code: i32, stderr_tail: &str) -> CommandState {
    match exit_code {
        0 => CommandState::Success,
        EXIT_NOT_FOUND => CommandState::CommandNotFound,
        EXIT_NOT_EXECUTABLE => CommandState::Others,
        _ if network_patterns().is_match(stderr_tail) => CommandState::NetworkError,
        _ if not_found_patterns().is_match(stderr_tail) => CommandState::CommandNotFound,
        _ if stderr_tail.contains("No such file or directory") => CommandState::FileNotFound,
        _ => CommandState::Others,
    }
}

/// Terminal outcome for a command that exited normally, with a synthetic summary
pub fn exit_outcome(command: &str, exit_code: i32, stderr_tail: &str) -> TerminalOutcome {
    let state = classify_exit(exit_code, stderr_tail);
    let last_line = stderr_tail.lines().rev().find(|l| !l.trim().is_empty()).map(str::trim);
    let summary = match (state, last_line) {
        (CommandState::Success, _) => "Completed successfully.".to_string(),
        (CommandState::CommandNotFound, _) => format!("Command not found: {command}"),
        (_, Some(line)) => format!("Exited with code {exit_code}: {line}"),
        (_, None) => format!("Exited with code {exit_code}."),
    };
    TerminalOutcome::new(state, exit_code).with_summary(summary)
}

/// Read at most the last `max_bytes` of a file as lossy UTF-8.
///
/// Missing or unreadable files read as empty.
pub fn read_tail(path: &Path, max_bytes: u64) -> String {
    let Ok(mut file) = std::fs::File::open(path) else {
        return String::new();
    };
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    if len > max_bytes && file.seek(SeekFrom::Start(len - max_bytes)).is_err() {
        return String::new();
    }
    let mut buf = Vec::new();
    if file.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
