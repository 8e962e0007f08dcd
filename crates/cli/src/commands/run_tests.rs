// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;
use wsh_core::{CommandState, JobId, JobState};
use yare::parameterized;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    run: RunArgs,
}

fn parse(args: &[&str]) -> RunArgs {
    let mut argv = vec!["wsh-run"];
    argv.extend_from_slice(args);
    TestCli::try_parse_from(argv).unwrap().run
}

#[test]
fn literal_commands_use_given_timeout() {
    let args = parse(&["list files", "--cmd", "ls -la", "--cmd", "id", "--timeout", "5"]);
    assert_eq!(
        args.submission(300),
        Submission::Commands(vec![CommandSpec::new("ls -la", 5), CommandSpec::new("id", 5)])
    );
}

#[test]
fn literal_commands_fall_back_to_default_timeout() {
    let args = parse(&["g", "--cmd", "uptime"]);
    assert_eq!(args.submission(300), Submission::Commands(vec![CommandSpec::new("uptime", 300)]));
}

#[test]
fn no_commands_means_generation_with_context() {
    let args = parse(&["find web roots", "--context", "rag.hint=nginx", "--context", "scope=dmz"]);
    let Submission::Generate(context) = args.submission(300) else {
        panic!("expected generation");
    };
    assert_eq!(context.get("rag.hint").map(String::as_str), Some("nginx"));
    assert_eq!(context.len(), 2);
}

#[test]
fn generator_flag_conflicts_with_commands() {
    let argv = ["wsh-run", "g", "--cmd", "id", "--generator", "/bin/plan"];
    assert!(TestCli::try_parse_from(argv).is_err());
}

#[test]
fn generator_flag_beats_config() {
    let config = WshConfig {
        generator: Some(GeneratorConfig::new("/from/config")),
        ..WshConfig::default()
    };
    assert_eq!(
        parse(&["g", "--generator", "/from/flag"]).generator(&config).unwrap().program,
        PathBuf::from("/from/flag")
    );
    assert_eq!(parse(&["g"]).generator(&config).unwrap().program, PathBuf::from("/from/config"));
    assert!(parse(&["g"]).generator(&WshConfig::default()).is_none());
}

#[parameterized(
    simple = { "a=b", Some(("a", "b")) },
    value_with_equals = { "url=http://x/?q=1", Some(("url", "http://x/?q=1")) },
    empty_value = { "a=", Some(("a", "")) },
    missing_equals = { "ab", None },
    empty_key = { "=b", None },
)]
fn key_value_parsing(input: &str, expected: Option<(&str, &str)>) {
    let parsed = parse_key_value(input).ok();
    assert_eq!(parsed, expected.map(|(k, v)| (k.to_string(), v.to_string())));
}

#[test]
fn event_lines() {
    let job_id = JobId::from("job-abc");
    assert_eq!(
        event_line(&JobEvent::JobCreated { job_id: job_id.clone(), goal: "g".to_string() }),
        None
    );
    let started = event_line(&JobEvent::CommandStarted {
        job_id: job_id.clone(),
        seq: 3,
        command: "nmap -sV 10.0.0.1".to_string(),
        is_retry: true,
    })
    .unwrap();
    assert!(started.starts_with("[3] "));
    assert!(started.contains("retry"));
    assert!(started.ends_with("nmap -sV 10.0.0.1"));

    let finished = event_line(&JobEvent::CommandFinished {
        job_id: job_id.clone(),
        seq: 3,
        state: CommandState::Timeout,
        exit_code: Some(-1),
        summary: Some("Timed out after 1s.".to_string()),
    })
    .unwrap();
    assert!(finished.contains("timeout"));
    assert!(finished.ends_with("Timed out after 1s."));

    assert_eq!(
        event_line(&JobEvent::RetrySubmitted {
            job_id: job_id.clone(),
            classification: "network_error".to_string(),
            seqs: vec![4, 5],
        })
        .unwrap(),
        "Retrying after network_error failure: 2 replacement commands"
    );
    assert_eq!(
        event_line(&JobEvent::JobFinished {
            job_id,
            state: JobState::Done,
            message: "All commands completed.".to_string(),
        })
        .unwrap(),
        "All commands completed."
    );
}
