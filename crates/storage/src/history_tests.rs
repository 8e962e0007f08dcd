// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wsh_core::test_support::{job_with_states, test_job};
use wsh_core::{CommandState, JobState};

#[test]
fn save_then_load_preserves_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("history"));
    let mut job = job_with_states(&[CommandState::Success, CommandState::Timeout]);
    job.finalize(2_000_000);

    store.save(&job).unwrap();
    let loaded = store.load(job.id.as_str()).unwrap();

    assert_eq!(loaded.state, JobState::Failed);
    assert_eq!(loaded.results, job.results);
    assert!(store.path_for(&job.id).exists());
    assert!(!store.path_for(&job.id).with_extension("json.tmp").exists());
}

#[test]
fn load_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    assert!(matches!(store.load("job-nope"), Err(StoreError::NotFound(_))));
}

#[test]
fn list_is_newest_first_and_skips_corrupt_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    let mut older = test_job("job-older");
    older.created_at_ms = 1;
    let mut newer = test_job("job-newer");
    newer.created_at_ms = 2;
    store.save(&older).unwrap();
    store.save(&newer).unwrap();
    std::fs::write(dir.path().join("job-broken.json"), "{not json").unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|j| j.id.to_string()).collect();

    assert_eq!(ids, vec!["job-newer", "job-older"]);
}

#[test]
fn list_of_missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("never-created"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn resolve_accepts_unique_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    store.save(&test_job("job-abc123")).unwrap();
    store.save(&test_job("job-abd456")).unwrap();

    assert_eq!(store.resolve("job-abc123").unwrap().id.as_str(), "job-abc123");
    assert_eq!(store.resolve("abc").unwrap().id.as_str(), "job-abc123");
    assert!(matches!(store.resolve("ab"), Err(StoreError::Ambiguous { count: 2, .. })));
    assert!(matches!(store.resolve("zzz"), Err(StoreError::NotFound(_))));
}

#[test]
fn save_overwrites_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    let mut job = test_job("job-same");
    store.save(&job).unwrap();
    job.goal = "changed".to_string();
    store.save(&job).unwrap();

    assert_eq!(store.load("job-same").unwrap().goal, "changed");
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn memory_store_counts_saves_and_can_fail() {
    let store = crate::MemoryJobStore::new();
    let job = test_job("job-mem");
    store.save(&job).unwrap();
    store.set_failing(true);

    assert!(store.save(&job).is_err());
    assert_eq!(store.save_count(), 1);
}
