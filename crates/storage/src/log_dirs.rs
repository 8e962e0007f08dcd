// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job log directories

use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use wsh_core::JobId;

/// Creates the directory a job's command logs are written into
pub trait LogDirFactory: Send + Sync + 'static {
    fn create_dir(&self, job_id: &JobId) -> std::io::Result<PathBuf>;
}

/// Lays out `<root>/<YYYY-MM-DD>/<job_id>/`, dated by local time
#[derive(Debug, Clone)]
pub struct DatedLogDirs {
    root: PathBuf,
    date: Option<NaiveDate>,
}

impl DatedLogDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), date: None }
    }

    /// Pin the date component instead of using today's
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn path_for(&self, job_id: &JobId) -> PathBuf {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        self.root.join(date.format("%Y-%m-%d").to_string()).join(job_id.as_str())
    }
}

impl LogDirFactory for DatedLogDirs {
    fn create_dir(&self, job_id: &JobId) -> std::io::Result<PathBuf> {
        let dir = self.path_for(job_id);
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(%job_id, dir = %dir.display(), "created log directory");
        Ok(dir)
    }
}

#[cfg(test)]
#[path = "log_dirs_tests.rs"]
mod tests;
