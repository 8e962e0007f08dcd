// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::backend::{FakeRemoteSession, RemoteCall};
use tempfile::TempDir;
use wsh_core::test_support::test_job;
use wsh_core::{CommandSpec, JobId};

struct Harness {
    session: FakeRemoteSession,
    backend: Arc<RemoteBackend>,
    job: SharedJob,
    _dir: TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut job = test_job("job-remote");
    job.log_dir = dir.path().to_path_buf();
    let session = FakeRemoteSession::new("session-1");
    let backend = RemoteBackend::connect(Arc::new(session.clone()))
        .await
        .unwrap()
        .with_timeout_slack(Duration::ZERO);
    Harness { session, backend: Arc::new(backend), job: job.into_shared(), _dir: dir }
}

impl Harness {
    fn launch(&self, seq: u32, command: &str, timeout_secs: u64) -> (Launch, LogSink) {
        let dir = self.job.lock().log_dir.clone();
        (Launch::new(seq, CommandSpec::new(command, timeout_secs)), LogSink::create(&dir, seq).unwrap())
    }

    async fn run(&self, seq: u32, command: &str, timeout_secs: u64) -> CommandResult {
        let (launch, sink) = self.launch(seq, command, timeout_secs);
        self.backend.start(&self.job, launch, sink).await;
        self.result(seq)
    }

    fn result(&self, seq: u32) -> CommandResult {
        self.job.lock().result(seq).cloned().unwrap()
    }

    fn key(&self, seq: u32) -> CommandKey {
        CommandKey::new(JobId::from("job-remote"), seq)
    }
}

#[tokio::test]
async fn connect_rejects_dead_session() {
    let session = FakeRemoteSession::new("session-dead");
    session.set_dead(true);
    let err = RemoteBackend::connect(Arc::new(session)).await.err().unwrap();
    assert!(matches!(err, BackendError::SessionDead(ref id) if id == "session-dead"));
}

#[tokio::test]
async fn successful_response_is_written_then_transitioned() {
    let h = harness().await;
    h.session.respond_output("id", 0, "uid=33(www-data)\n", "");

    let result = h.run(1, "id", 30).await;

    assert_eq!(result.state, CommandState::Success);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(std::fs::read_to_string(&result.stdout_path).unwrap(), "uid=33(www-data)\n");
    assert!(h.backend.in_flight().is_empty());
    assert_eq!(
        h.session.calls(),
        vec![RemoteCall::Execute { command: "id".to_string(), timeout: Duration::from_secs(30) }]
    );
}

#[tokio::test]
async fn nonzero_exit_is_classified_like_local() {
    let h = harness().await;
    h.session.respond_output("curl http://10.0.0.5", 7, "", "curl: (7) Connection refused\n");
    h.session.respond_output("nmapx", 127, "", "sh: nmapx: not found\n");

    assert_eq!(h.run(1, "curl http://10.0.0.5", 30).await.state, CommandState::NetworkError);
    let missing = h.run(2, "nmapx", 30).await;
    assert_eq!(missing.state, CommandState::CommandNotFound);
    assert_eq!(missing.log_summary.as_deref(), Some("Command not found: nmapx"));
}

#[tokio::test]
async fn session_errors_map_to_states() {
    let h = harness().await;
    h.session.respond("ls", Err(RemoteError::Operation("channel closed".to_string())));
    h.session.respond("ping", Err(RemoteError::Network("reset by peer".to_string())));

    let failed = h.run(1, "ls", 30).await;
    assert_eq!(failed.state, CommandState::RemoteOperationFailed);
    assert_eq!(failed.exit_code, Some(-1));
    assert!(std::fs::read_to_string(&failed.stderr_path).unwrap().contains("channel closed"));

    assert_eq!(h.run(2, "ping", 30).await.state, CommandState::NetworkError);
}

#[tokio::test(start_paused = true)]
async fn slow_response_is_timeout() {
    let h = harness().await;
    h.session.delay("sleep 5", Duration::from_secs(5));

    let result = h.run(1, "sleep 5", 1).await;

    assert_eq!(result.state, CommandState::Timeout);
    assert_eq!(result.log_summary.as_deref(), Some("Timed out after 1s."));
}

#[tokio::test(start_paused = true)]
async fn cancel_wins_over_pending_response() {
    let h = harness().await;
    h.session.delay("sleep 60", Duration::from_secs(60));
    let (launch, sink) = h.launch(1, "sleep 60", 120);

    let backend = Arc::clone(&h.backend);
    let job = Arc::clone(&h.job);
    let task = tokio::spawn(async move { backend.start(&job, launch, sink).await });
    while h.backend.in_flight().is_empty() {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.backend.cancel(&h.key(1)).await, "Command 1 cancelled.");
    task.await.unwrap();

    let result = h.result(1);
    assert_eq!(result.state, CommandState::UserCancelled);
    assert_eq!(result.exit_code, Some(-1));
    assert!(h.backend.in_flight().is_empty());
}

#[tokio::test]
async fn cancel_after_completion_is_not_running() {
    let h = harness().await;
    let done = h.run(1, "true", 30).await;

    assert_eq!(h.backend.cancel(&h.key(1)).await, "Command 1 is not running.");
    assert_eq!(h.result(1), done);
}

#[tokio::test]
async fn describe_host_uses_session_info() {
    let h = harness().await;
    h.session.set_executables(Ok(vec!["nmap".into(), "curl".into(), "nmap".into()]));

    let brief = h.backend.describe_host(false).await;
    assert_eq!(brief.user, "www-data");
    assert!(brief.inventory.is_empty());

    let full = h.backend.describe_host(true).await;
    assert_eq!(full.inventory, vec!["curl".to_string(), "nmap".to_string()]);
    assert!(!full.is_degraded());
}

#[tokio::test]
async fn describe_host_degrades_on_error() {
    let h = harness().await;
    h.session.set_info(Err(RemoteError::SessionDead));

    let host = h.backend.describe_host(false).await;

    assert!(host.is_degraded());
    assert_eq!(host.os, "unknown");
}

#[tokio::test(start_paused = true)]
async fn registration_is_signalled_before_the_response() {
    let h = harness().await;
    h.session.delay("sleep 60", Duration::from_secs(60));
    let (launch, sink) = h.launch(1, "sleep 60", 120);
    let (tx, rx) = tokio::sync::oneshot::channel();

    let backend = Arc::clone(&h.backend);
    let job = Arc::clone(&h.job);
    let task =
        tokio::spawn(async move { backend.start(&job, launch.notify_registered(tx), sink).await });
    rx.await.unwrap();

    // The running result and its in-flight entry are visible together
    assert_eq!(h.result(1).state, CommandState::Doing);
    assert_eq!(h.backend.in_flight(), vec![h.key(1)]);
    assert!(!task.is_finished());

    h.backend.cancel(&h.key(1)).await;
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_transitions_once_start_released_the_sink() {
    let h = harness().await;
    h.session.delay("sleep 60", Duration::from_secs(60));
    let (launch, sink) = h.launch(1, "sleep 60", 120);

    let backend = Arc::clone(&h.backend);
    let job = Arc::clone(&h.job);
    let task = tokio::spawn(async move { backend.start(&job, launch, sink).await });
    while h.backend.in_flight().is_empty() {
        tokio::task::yield_now().await;
    }

    let before = tokio::time::Instant::now();
    assert_eq!(h.backend.cancel(&h.key(1)).await, "Command 1 cancelled.");

    assert!(before.elapsed() < SINK_RELEASE_WAIT);
    assert_eq!(h.result(1).state, CommandState::UserCancelled);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_after_start_was_dropped_still_transitions() {
    let h = harness().await;
    h.session.delay("sleep 60", Duration::from_secs(60));
    let (launch, sink) = h.launch(1, "sleep 60", 120);

    let backend = Arc::clone(&h.backend);
    let job = Arc::clone(&h.job);
    let task = tokio::spawn(async move { backend.start(&job, launch, sink).await });
    while h.backend.in_flight().is_empty() {
        tokio::task::yield_now().await;
    }
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(h.backend.cancel(&h.key(1)).await, "Command 1 cancelled.");
    let result = h.result(1);
    assert_eq!(result.state, CommandState::UserCancelled);
    assert_eq!(result.exit_code, Some(-1));
}
