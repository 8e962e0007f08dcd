// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the engagement loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between status polls while waiting on a job
    pub poll_interval_ms: u64,
    /// Retry batches allowed per job before it is finalized as failed
    pub max_retries: u32,
    /// Timeout for commands given without one
    pub default_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 250, max_retries: 2, default_timeout_secs: 300 }
    }
}

impl EngineConfig {
    wsh_core::setters! {
        set poll_interval_ms: u64;
        set max_retries: u32;
        set default_timeout_secs: u64;
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
