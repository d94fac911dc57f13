// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution record and its lifecycle state machine.

use crate::id::{ExecutionId, ProjectKey, RepoId, Requester};
use crate::runnable::CommandLine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle state of an execution.
///
/// `Pending` and `Running` are live; the remaining four are terminal and
/// admit no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Admitted, waiting for the project's running slot
    Pending,
    /// Process spawned and being supervised
    Running,
    /// Process exited with status 0
    Succeeded,
    /// Process exited non-zero or was killed, without a cancel request
    Failed,
    /// Cancel request honored
    Cancelled,
    /// Engine-side fault, e.g. the command could not be spawned
    Errored,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded
                | ExecutionState::Failed
                | ExecutionState::Cancelled
                | ExecutionState::Errored
        )
    }

    /// Whether `self -> to` is an edge of the lifecycle partial order.
    pub fn can_transition_to(self, to: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, to),
            (Pending, Running | Cancelled | Errored)
                | (Running, Succeeded | Failed | Cancelled | Errored)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::Pending => "pending",
            ExecutionState::Running => "running",
            ExecutionState::Succeeded => "succeeded",
            ExecutionState::Failed => "failed",
            ExecutionState::Cancelled => "cancelled",
            ExecutionState::Errored => "errored",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// Normal exit with the given code
    Code(i32),
    /// Terminated by the given signal number
    Signal(i32),
}

impl ExitStatus {
    pub fn success(self) -> bool {
        self == ExitStatus::Code(0)
    }

    pub fn code(self) -> Option<i32> {
        match self {
            ExitStatus::Code(code) => Some(code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Code(code) => write!(f, "exit {}", code),
            ExitStatus::Signal(sig) => write!(f, "signal {}", sig),
        }
    }
}

/// Rejected attempt to move an execution along an edge that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal state transition for {id}: {from} -> {to}")]
pub struct TransitionError {
    pub id: ExecutionId,
    pub from: ExecutionState,
    pub to: ExecutionState,
}

/// A requested state change plus the data that travels with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: ExecutionState,
    pub exit_status: Option<ExitStatus>,
    pub error: Option<String>,
    pub cancelled_by: Option<Requester>,
}

impl Transition {
    pub fn to(state: ExecutionState) -> Self {
        Self {
            to: state,
            exit_status: None,
            error: None,
            cancelled_by: None,
        }
    }

    pub fn with_exit(mut self, status: ExitStatus) -> Self {
        self.exit_status = Some(status);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn cancelled_by(mut self, requester: Option<Requester>) -> Self {
        self.cancelled_by = requester;
        self
    }
}

/// One attempt to run a command under engine supervision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub project: ProjectKey,
    pub command: CommandLine,
    /// Directory the command runs in
    pub cwd: PathBuf,
    /// Commit or ref the working directory is expected to be at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub requester: Requester,
    pub state: ExecutionState,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub exit_status: Option<ExitStatus>,
    /// Durable record id, once the Job Repository has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<RepoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Requester>,
    /// Engine-side fault description for `errored` executions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Wall time between start and finish, if the execution ran to the end.
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at_ms, self.finished_at_ms) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }

    /// Apply `transition` at `at_ms`, or reject it leaving `self` untouched.
    pub fn apply(&mut self, transition: Transition, at_ms: u64) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(transition.to) {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.state,
                to: transition.to,
            });
        }

        self.state = transition.to;
        if transition.to == ExecutionState::Running {
            self.started_at_ms = Some(at_ms);
        }
        if transition.to.is_terminal() {
            self.finished_at_ms = Some(at_ms);
        }
        if transition.exit_status.is_some() {
            self.exit_status = transition.exit_status;
        }
        if transition.error.is_some() {
            self.error = transition.error;
        }
        if transition.cancelled_by.is_some() {
            self.cancelled_by = transition.cancelled_by;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
