// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine facade

use sy_adapters::RepositoryError;
use sy_core::{ExecutionId, ExecutionState, TransitionError};
use thiserror::Error;

/// Errors returned to engine callers
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is disabled")]
    Disabled,
    #[error("execution not found: {0}")]
    NotFound(ExecutionId),
    #[error("execution {id} already {state}")]
    AlreadyTerminal {
        id: ExecutionId,
        state: ExecutionState,
    },
    #[error(transparent)]
    IllegalTransition(#[from] TransitionError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
