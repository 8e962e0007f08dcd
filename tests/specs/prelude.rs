// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec helpers: an isolated state directory and fluent assertions over
//! `wsh` invocations.

use std::path::{Path, PathBuf};
use std::process::Output;

use tempfile::TempDir;

/// `wsh` with no state directory
pub fn cli() -> Wsh {
    Wsh::new()
}

/// A throwaway state directory shared by several `wsh` invocations
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn wsh(&self) -> Wsh {
        let mut wsh = Wsh::new();
        wsh.cmd.env("WSH_STATE_DIR", self.state_dir());
        wsh
    }
}

pub struct Wsh {
    cmd: assert_cmd::Command,
}

impl Wsh {
    fn new() -> Self {
        let mut cmd = assert_cmd::Command::cargo_bin("wsh").unwrap();
        cmd.env_remove("WSH_CONFIG")
            .env_remove("WSH_LOG")
            .env("NO_COLOR", "1")
            .env("WSH_POLL_MS", "20")
            .timeout(std::time::Duration::from_secs(30));
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(self) -> Run {
        self.exits(0)
    }

    pub fn exits(mut self, code: i32) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "unexpected exit status\nstdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).unwrap()
    }
}
