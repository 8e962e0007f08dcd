// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod history;
pub mod host;
pub mod run;

use crate::config::{ConfigError, WshConfig};
use crate::exit_error::ExitError;
use wsh_adapters::Backend;

/// Build the configured backend. The CLI has no remote transport, so a
/// remote backend is a configuration error here.
pub(crate) async fn backend(config: &WshConfig) -> Result<Backend, ExitError> {
    Backend::from_config(&config.backend, None)
        .await
        .map_err(|e| ExitError::usage(format!("cannot use configured backend: {e}")))
}

impl From<ConfigError> for ExitError {
    fn from(e: ConfigError) -> Self {
        ExitError::usage(e.to_string())
    }
}
