// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job repository.

use super::{JobRepository, RepositoryError, StateChange};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use sy_core::{Execution, ExecutionState, RepoId};

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    records: HashMap<RepoId, Execution>,
    history: HashMap<RepoId, Vec<ExecutionState>>,
}

/// Job repository kept in process memory.
///
/// Records live as long as the repository. Every recorded state is also
/// appended to a per-record history.
#[derive(Clone, Default)]
pub struct MemoryJobRepository {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// States recorded for `id`, oldest first, starting with the created state
    pub fn history(&self, id: &RepoId) -> Vec<ExecutionState> {
        self.inner
            .lock()
            .history
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every record, ordered by creation
    pub fn records(&self) -> Vec<Execution> {
        let state = self.inner.lock();
        let mut records: Vec<Execution> = state.records.values().cloned().collect();
        records.sort_by_key(|r| (r.created_at_ms, r.repo_id.clone()));
        records
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn record_created(&self, execution: &Execution) -> Result<RepoId, RepositoryError> {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let id = RepoId::new(format!("job-{}", state.next_id));
        let mut record = execution.clone();
        record.repo_id = Some(id.clone());
        state.history.insert(id.clone(), vec![record.state]);
        state.records.insert(id.clone(), record);
        Ok(id)
    }

    async fn record_state_change(
        &self,
        id: &RepoId,
        change: &StateChange,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        record.state = change.state;
        record.started_at_ms = change.started_at_ms;
        record.finished_at_ms = change.finished_at_ms;
        record.exit_status = change.exit_status;
        record.cancelled_by = change.cancelled_by.clone();
        record.error = change.error.clone();
        state
            .history
            .entry(id.clone())
            .or_default()
            .push(change.state);
        Ok(())
    }

    async fn find(&self, id: &RepoId) -> Result<Execution, RepositoryError> {
        self.inner
            .lock()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
