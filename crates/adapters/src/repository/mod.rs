// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job repository adapters
//!
//! The repository owns durable job metadata. The engine writes to it on
//! creation and on every state transition but never reads back through it
//! to make control decisions.

mod memory;

pub use memory::MemoryJobRepository;

use async_trait::async_trait;
use sy_core::{Execution, ExecutionState, ExitStatus, RepoId, Requester};
use thiserror::Error;

/// Errors from repository operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("job record not found: {0}")]
    NotFound(RepoId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One recorded transition: the new state and everything that changed with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub state: ExecutionState,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub exit_status: Option<ExitStatus>,
    pub cancelled_by: Option<Requester>,
    pub error: Option<String>,
}

impl From<&Execution> for StateChange {
    fn from(exec: &Execution) -> Self {
        Self {
            state: exec.state,
            started_at_ms: exec.started_at_ms,
            finished_at_ms: exec.finished_at_ms,
            exit_status: exec.exit_status,
            cancelled_by: exec.cancelled_by.clone(),
            error: exec.error.clone(),
        }
    }
}

/// Adapter for the durable job store
#[async_trait]
pub trait JobRepository: Clone + Send + Sync + 'static {
    /// Persist a freshly admitted execution and return its record id
    async fn record_created(&self, execution: &Execution) -> Result<RepoId, RepositoryError>;

    /// Persist a state transition of a previously created record
    async fn record_state_change(
        &self,
        id: &RepoId,
        change: &StateChange,
    ) -> Result<(), RepositoryError>;

    /// Read a record back
    async fn find(&self, id: &RepoId) -> Result<Execution, RepositoryError>;
}
