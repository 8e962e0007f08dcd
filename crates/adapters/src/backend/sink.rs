// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-command log files.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A pair of append-only byte streams for one command's stdout and stderr.
///
/// Layout: `<dir>/<seq>.stdout.log` and `<dir>/<seq>.stderr.log`.
/// The files are closed when the sink is consumed or dropped.
#[derive(Debug)]
pub struct LogSink {
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    stdout: File,
    stderr: File,
}

impl LogSink {
    /// Create (or reopen for append) the log files for `seq` under `dir`
    pub fn create(dir: &Path, seq: u32) -> Result<Self, SinkError> {
        fs::create_dir_all(dir)
            .map_err(|source| SinkError::Open { path: dir.to_path_buf(), source })?;
        let stdout_path = dir.join(format!("{seq}.stdout.log"));
        let stderr_path = dir.join(format!("{seq}.stderr.log"));
        let stdout = open_append(&stdout_path)?;
        let stderr = open_append(&stderr_path)?;
        Ok(Self { stdout_path, stderr_path, stdout, stderr })
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    /// Paths of both streams, for recording in the command result
    pub fn paths(&self) -> (PathBuf, PathBuf) {
        (self.stdout_path.clone(), self.stderr_path.clone())
    }

    /// Hand both files to a child process. The parent's handles are closed
    /// once the child has been spawned.
    pub fn into_stdio(self) -> (Stdio, Stdio) {
        (Stdio::from(self.stdout), Stdio::from(self.stderr))
    }

    /// Write captured output, flush to disk, and close both files.
    pub fn write_output(mut self, stdout: &[u8], stderr: &[u8]) -> Result<(), SinkError> {
        write_all(&mut self.stdout, &self.stdout_path, stdout)?;
        write_all(&mut self.stderr, &self.stderr_path, stderr)?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SinkError::Open { path: path.to_path_buf(), source })
}

fn write_all(file: &mut File, path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .and_then(|()| file.sync_data())
        .map_err(|source| SinkError::Write { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
