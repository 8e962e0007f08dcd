// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifying metadata for the machine a backend executes on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host metadata reported by a backend.
///
/// A descriptor with `error` set is degraded: fields that could not be
/// collected are left as `"unknown"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub os: String,
    pub arch: String,
    pub hostname: String,
    pub user: String,
    /// Executable names found on the host (full inventory only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const UNKNOWN: &str = "unknown";

impl HostDescriptor {
    /// Descriptor returned when the backend could not describe its host
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            os: UNKNOWN.to_string(),
            arch: UNKNOWN.to_string(),
            hostname: UNKNOWN.to_string(),
            user: UNKNOWN.to_string(),
            inventory: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Flatten into generator context entries (`host.os`, `host.arch`, ...)
    pub fn to_context(&self) -> BTreeMap<String, String> {
        let mut ctx = BTreeMap::new();
        ctx.insert("host.os".to_string(), self.os.clone());
        ctx.insert("host.arch".to_string(), self.arch.clone());
        ctx.insert("host.hostname".to_string(), self.hostname.clone());
        ctx.insert("host.user".to_string(), self.user.clone());
        if !self.inventory.is_empty() {
            ctx.insert("host.inventory".to_string(), self.inventory.join(","));
        }
        if let Some(ref error) = self.error {
            ctx.insert("host.error".to_string(), error.clone());
        }
        ctx
    }
}

impl std::fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({}/{})", self.user, self.hostname, self.os, self.arch)?;
        if let Some(ref error) = self.error {
            write!(f, " [degraded: {}]", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
