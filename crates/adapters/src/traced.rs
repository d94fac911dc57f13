// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{ProcessAdapter, ProcessHandle, SpawnError, SpawnSpec};
use crate::repository::{JobRepository, RepositoryError, StateChange};
use async_trait::async_trait;
use sy_core::{Execution, RepoId};
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, SpawnError> {
        async {
            tracing::info!(env_count = spec.env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(handle) => tracing::info!(pid = ?handle.pid(), elapsed_ms, "process started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "process.spawn",
            command = %spec.command,
            cwd = %spec.cwd.display()
        ))
        .await
    }
}

/// Wrapper that adds tracing to any JobRepository
#[derive(Clone)]
pub struct TracedRepository<R> {
    inner: R,
}

impl<R> TracedRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: JobRepository> JobRepository for TracedRepository<R> {
    async fn record_created(&self, execution: &Execution) -> Result<RepoId, RepositoryError> {
        let result = self.inner.record_created(execution).await;
        tracing::info_span!("repo.record_created", execution_id = %execution.id).in_scope(
            || match &result {
                Ok(id) => tracing::debug!(repo_id = %id, "recorded"),
                Err(e) => tracing::error!(error = %e, "record failed"),
            },
        );
        result
    }

    async fn record_state_change(
        &self,
        id: &RepoId,
        change: &StateChange,
    ) -> Result<(), RepositoryError> {
        let result = self.inner.record_state_change(id, change).await;
        tracing::info_span!("repo.record_state_change", repo_id = %id, state = %change.state)
            .in_scope(|| match &result {
                Ok(()) => tracing::debug!("recorded"),
                Err(e) => tracing::error!(error = %e, "record failed"),
            });
        result
    }

    async fn find(&self, id: &RepoId) -> Result<Execution, RepositoryError> {
        let result = self.inner.find(id).await;
        tracing::trace!(repo_id = %id, found = result.is_ok(), "looked up");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
