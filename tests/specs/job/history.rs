//! `wsh history` / `wsh show` specs: finished jobs are persisted once

use crate::prelude::*;

#[test]
fn history_is_empty_initially() {
    let temp = Project::empty();
    temp.wsh().args(&["history"]).passes().stdout_has("No jobs");
}

#[test]
fn finished_job_appears_in_history_and_show() {
    let temp = Project::empty();
    let run = temp.wsh().args(&["run", "list tmp", "--cmd", "ls /", "--json"]).passes();
    let id = run.json()["id"].as_str().unwrap().to_string();

    let history = temp.wsh().args(&["history", "--json"]).passes().json();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], id.as_str());

    temp.wsh()
        .args(&["show", &id])
        .passes()
        .stdout_has("list tmp")
        .stdout_has("ls /");

    let records = std::fs::read_dir(temp.state_dir().join("jobs")).unwrap().count();
    assert_eq!(records, 1);
}

#[test]
fn command_logs_are_written_under_state_dir() {
    let temp = Project::empty();
    let run = temp.wsh().args(&["run", "greet", "--cmd", "echo hello-logs", "--json"]).passes();
    let stdout_path = run.json()["results"]["1"]["stdout_path"].as_str().unwrap().to_string();

    assert!(stdout_path.starts_with(temp.state_dir().join("logs").to_str().unwrap()));
    assert_eq!(std::fs::read_to_string(stdout_path).unwrap(), "hello-logs\n");
}

#[test]
fn show_unknown_job_fails() {
    let temp = Project::empty();
    temp.wsh().args(&["show", "does-not-exist"]).exits(1).stderr_has("no job matching");
}
