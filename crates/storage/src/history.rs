// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted job history.
//!
//! Each finished job is written once as `<dir>/<job_id>.json`. Writes go to
//! a temporary sibling first and are renamed into place, so readers never
//! observe a partial record.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wsh_core::{Job, JobId};

/// Errors from job persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid job record {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no job matching '{0}'")]
    NotFound(String),
    #[error("'{prefix}' matches {count} jobs")]
    Ambiguous { prefix: String, count: usize },
}

/// Destination for finished jobs
pub trait JobStore: Send + Sync + 'static {
    /// Persist a terminal job. Called exactly once per job.
    fn save(&self, job: &Job) -> Result<(), StoreError>;
}

/// Directory of JSON job records
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Load a job by exact id
    pub fn load(&self, id: &str) -> Result<Job, StoreError> {
        let path = self.dir.join(format!("{id}.json"));
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json { path, source })
    }

    /// Load a job by exact id or unique id prefix.
    ///
    /// The `job-` prefix may be omitted.
    pub fn resolve(&self, query: &str) -> Result<Job, StoreError> {
        match self.load(query) {
            Err(StoreError::NotFound(_)) => {}
            other => return other,
        }
        let mut matches: Vec<String> = self
            .ids()?
            .into_iter()
            .filter(|id| JobId::from(id.as_str()).matches(query))
            .collect();
        match matches.len() {
            0 => Err(StoreError::NotFound(query.to_string())),
            1 => self.load(&matches.remove(0)),
            count => Err(StoreError::Ambiguous { prefix: query.to_string(), count }),
        }
    }

    /// All readable jobs, newest first. Corrupt records are skipped.
    pub fn list(&self) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::new();
        for id in self.ids()? {
            match self.load(&id) {
                Ok(job) => jobs.push(job),
                Err(e) => tracing::warn!(%id, error = %e, "skipping unreadable job record"),
            }
        }
        jobs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    fn ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: self.dir.clone(), source }),
        };
        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io { path: path.to_path_buf(), source };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_err)
    }
}

impl JobStore for HistoryStore {
    fn save(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.path_for(&job.id);
        let bytes = serde_json::to_vec_pretty(job)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        self.write_atomic(&path, &bytes)?;
        tracing::info!(job_id = %job.id, state = %job.state, path = %path.display(), "job saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
