// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;
use wsh_core::{CommandSpec, TerminalOutcome};
use yare::parameterized;

fn finished(dir: &Path, state: CommandState, code: i32, stdout: &str, stderr: &str) -> CommandResult {
    let stdout_path = dir.join("1.stdout.log");
    let stderr_path = dir.join("1.stderr.log");
    std::fs::write(&stdout_path, stdout).unwrap();
    std::fs::write(&stderr_path, stderr).unwrap();
    let spec = CommandSpec::new("nmap 10.0.0.5", 30);
    let mut result = CommandResult::started(1, &spec, stdout_path, stderr_path, 0);
    result.finish(TerminalOutcome::new(state, code).with_summary("synthetic"), 10).unwrap();
    result
}

#[parameterized(
    success_with_output = { CommandState::Success, 0, "Starting\n22/tcp open ssh\n\n", "", "Completed successfully. Last output: 22/tcp open ssh" },
    success_silent = { CommandState::Success, 0, "", "", "Completed successfully with no output." },
    failure_with_stderr = { CommandState::NetworkError, 1, "", "connect: Connection refused\n", "network_error (exit 1): connect: Connection refused" },
    failure_keeps_synthetic = { CommandState::Others, 2, "partial\n", "", "synthetic" },
)]
fn summarizes_from_log_tails(state: CommandState, code: i32, stdout: &str, stderr: &str, expected: &str) {
    let dir = tempfile::tempdir().unwrap();
    let result = finished(dir.path(), state, code, stdout, stderr);
    assert_eq!(HeuristicAnalyzer::summarize(&result, stdout, stderr), expected);
}

#[tokio::test]
async fn heuristic_reads_files_and_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let result = finished(dir.path(), CommandState::Success, 0, "uid=0(root)\n", "");

    let analysis = HeuristicAnalyzer::default().analyze(&result).await.unwrap();

    assert_eq!(analysis.state, CommandState::Success);
    assert_eq!(analysis.summary, "Completed successfully. Last output: uid=0(root)");
}

#[tokio::test]
async fn heuristic_tolerates_missing_logs() {
    let spec = CommandSpec::new("nmapx", 30);
    let result = CommandResult::terminal_at_creation(
        1,
        &spec,
        TerminalOutcome::command_not_found("nmapx"),
        0,
    );

    let analysis = HeuristicAnalyzer::new(64).analyze(&result).await.unwrap();

    assert_eq!(analysis.summary, "Command not found: nmapx");
}

#[tokio::test]
async fn fake_analyzer_fails_configured_seqs() {
    let dir = tempfile::tempdir().unwrap();
    let result = finished(dir.path(), CommandState::Success, 0, "", "");
    let analyzer = FakeAnalyzer::new();

    assert_eq!(analyzer.analyze(&result).await.unwrap().summary, "analyzed: nmap 10.0.0.5");
    analyzer.fail_seq(1, CollaboratorError::Unavailable("down".to_string()));
    assert!(analyzer.analyze(&result).await.is_err());
    assert_eq!(analyzer.analyzed(), vec![1, 1]);
}
