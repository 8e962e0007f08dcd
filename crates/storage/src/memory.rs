// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::history::{JobStore, StoreError};
use parking_lot::Mutex;
use std::sync::Arc;
use wsh_core::Job;

#[derive(Default)]
struct MemoryState {
    saved: Vec<Job>,
    fail: bool,
}

/// In-memory job store that records every save
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail with an IO error
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    pub fn saved(&self) -> Vec<Job> {
        self.inner.lock().saved.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().saved.len()
    }
}

impl JobStore for MemoryJobStore {
    fn save(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Io {
                path: format!("memory://{}", job.id).into(),
                source: std::io::Error::other("store unavailable"),
            });
        }
        inner.saved.push(job.clone());
        Ok(())
    }
}
