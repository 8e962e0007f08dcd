// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers: `job-` followed by a 19 character nanoid.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

const SUFFIX_LEN: usize = 19;

/// Longest prefix of `s` that is at most `n` characters
pub fn short(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(SmolStr);

impl JobId {
    pub const PREFIX: &'static str = "job-";

    pub fn new() -> Self {
        Self(SmolStr::new(format!("{}{}", Self::PREFIX, nanoid::nanoid!(SUFFIX_LEN))))
    }

    /// Wrap an existing id as given (records on disk, user input, tests)
    pub fn from_string(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without `job-`
    pub fn suffix(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// First `n` characters of the suffix, for tables
    pub fn short(&self, n: usize) -> &str {
        short(self.suffix(), n)
    }

    /// Whether `query` names this id: the full id or a prefix of it, with
    /// or without `job-`. Empty queries match nothing.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.strip_prefix(Self::PREFIX).unwrap_or(query);
        !query.is_empty() && self.suffix().starts_with(query)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl std::borrow::Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
