// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;

/// Version string shown by `wsh --version`
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve state directory: WSH_STATE_DIR > XDG_STATE_HOME/wsh > ~/.local/state/wsh
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty("WSH_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("wsh"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/wsh"))
}

/// Config file path from `WSH_CONFIG`
pub fn config_path() -> Option<PathBuf> {
    non_empty("WSH_CONFIG").map(PathBuf::from)
}

/// Status poll interval override
pub fn poll_ms() -> Option<u64> {
    parsed("WSH_POLL_MS")
}

pub fn max_retries() -> Option<u32> {
    parsed("WSH_MAX_RETRIES")
}

/// Shell for the local backend
pub fn shell() -> Option<String> {
    non_empty("WSH_SHELL")
}

/// Log filter directive (default `warn`)
pub fn log_filter() -> String {
    non_empty("WSH_LOG").unwrap_or_else(|| "warn".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = non_empty(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
