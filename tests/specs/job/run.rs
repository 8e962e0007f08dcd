//! `wsh run` specs: literal commands run to a terminal job state

use crate::prelude::*;

#[test]
fn echo_ok_completes_done() {
    let temp = Project::empty();
    temp.wsh()
        .args(&["run", "say ok", "--cmd", "echo ok"])
        .passes()
        .stdout_has("success")
        .stdout_has("All commands completed.");
}

#[test]
fn failing_command_exits_one() {
    let temp = Project::empty();
    temp.wsh()
        .args(&["run", "fail", "--cmd", "echo boom >&2; exit 3"])
        .exits(1)
        .stdout_has("others")
        .stderr_has("Some commands failed.");
}

#[test]
fn timeout_fails_job() {
    let temp = Project::empty();
    let run = temp
        .wsh()
        .args(&["run", "slow", "--cmd", "sleep 5", "--timeout", "1", "--json"])
        .exits(1);
    let job = run.json();
    assert_eq!(job["state"], "FAILED");
    assert_eq!(job["results"]["1"]["state"], "TIMEOUT");
    assert_eq!(job["results"]["1"]["exit_code"], -1);
}

#[test]
fn missing_binary_is_command_not_found() {
    let temp = Project::empty();
    let run = temp.wsh().args(&["run", "scan", "--cmd", "nmapx -sV", "--json"]).exits(1);
    assert_eq!(run.json()["results"]["1"]["state"], "COMMAND_NOT_FOUND");
}

#[test]
fn commands_run_in_submission_order() {
    let temp = Project::empty();
    let run = temp
        .wsh()
        .args(&["run", "two", "--cmd", "echo first", "--cmd", "echo second", "--json"])
        .passes();
    let job = run.json();
    assert_eq!(job["results"]["1"]["command"], "echo first");
    assert_eq!(job["results"]["2"]["command"], "echo second");
    assert_eq!(job["state"], "DONE");
}

#[test]
fn run_without_commands_or_generator_is_usage_error() {
    let temp = Project::empty();
    temp.wsh().args(&["run", "anything"]).exits(2).stderr_has("--cmd");
}

#[test]
fn external_generator_supplies_commands() {
    let temp = Project::empty();
    let generator = temp.file(
        "plan.sh",
        "#!/bin/sh\ncat > /dev/null\necho '[{\"command\": \"echo generated\", \"timeout\": 5}]'\n",
    );
    make_executable(&generator);

    let run = temp
        .wsh()
        .args(&["run", "generate", "--generator", generator.to_str().unwrap(), "--json"])
        .passes();
    assert_eq!(run.json()["results"]["1"]["command"], "echo generated");
}

#[test]
fn broken_generator_fails_job_with_api_error() {
    let temp = Project::empty();
    let generator = temp.file("plan.sh", "#!/bin/sh\necho 'model offline' >&2\nexit 1\n");
    make_executable(&generator);

    let run = temp
        .wsh()
        .args(&["run", "generate", "--generator", generator.to_str().unwrap(), "--json"])
        .exits(1);
    assert_eq!(run.json()["results"]["1"]["state"], "API_ERROR");
}

fn make_executable(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
