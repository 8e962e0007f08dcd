// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsh.toml` loading.
//!
//! Resolution order for every setting: environment override, then the
//! config file, then built-in defaults.
//!
//! ```toml
//! state_dir = "/var/lib/wsh"
//!
//! [backend]
//! kind = "local"
//! shell = "bash"
//!
//! [engine]
//! max_retries = 1
//!
//! [generator]
//! program = "/usr/local/bin/plan-commands"
//! args = ["--model", "small"]
//! ```

use crate::env;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wsh_adapters::{BackendConfig, ExternalGenerator};
use wsh_engine::EngineConfig;

const CONFIG_FILE: &str = "wsh.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot determine state directory; set WSH_STATE_DIR")]
    NoStateDir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WshConfig {
    pub state_dir: Option<PathBuf>,
    pub backend: BackendConfig,
    pub engine: EngineConfig,
    pub generator: Option<GeneratorConfig>,
}

/// External command generator program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

fn default_generator_timeout() -> u64 {
    120
}

impl GeneratorConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new(), timeout_secs: default_generator_timeout() }
    }

    pub fn build(&self, default_timeout_secs: u64) -> ExternalGenerator {
        ExternalGenerator::new(&self.program)
            .args(self.args.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .default_timeout_secs(default_timeout_secs)
    }
}

/// Values taken from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub state_dir: Option<PathBuf>,
    pub poll_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub shell: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            state_dir: std::env::var_os("WSH_STATE_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            poll_ms: env::poll_ms(),
            max_retries: env::max_retries(),
            shell: env::shell(),
        }
    }
}

impl WshConfig {
    /// Load from `explicit` (which must exist), else `WSH_CONFIG`, else the
    /// user config dir when a file is there, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map(Path::to_path_buf).or_else(env::config_path);
        let config = match path {
            Some(path) => Self::read(&path)?,
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => Self::read(&path)?,
                None => Self::default(),
            },
        };
        Ok(config.with_overrides(Overrides::from_env()))
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.state_dir {
            self.state_dir = Some(dir);
        }
        if let Some(ms) = overrides.poll_ms {
            self.engine.poll_interval_ms = ms;
        }
        if let Some(n) = overrides.max_retries {
            self.engine.max_retries = n;
        }
        if let (Some(shell), BackendConfig::Local(local)) = (overrides.shell, &mut self.backend) {
            local.shell = shell;
        }
        self
    }

    pub fn state_dir(&self) -> Result<PathBuf, ConfigError> {
        self.state_dir.clone().or_else(env::state_dir).ok_or(ConfigError::NoStateDir)
    }

    /// Directory of persisted job records
    pub fn history_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.state_dir()?.join("jobs"))
    }

    /// Root of the per-job log directories
    pub fn logs_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.state_dir()?.join("logs"))
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wsh").join(CONFIG_FILE))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
