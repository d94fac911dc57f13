// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{CommandLine, Execution, ExecutionId, ExecutionRequest, ExecutionState, Requester};
use std::path::PathBuf;

/// Shell request for `project` running `script` in `/tmp`.
pub fn shell_request(project: &str, script: &str) -> ExecutionRequest {
    ExecutionRequest::new(project, CommandLine::shell(script), "/tmp", "tester")
}

/// Fresh pending execution record.
pub fn pending_execution(id: &str, project: &str) -> Execution {
    Execution {
        id: ExecutionId::new(id),
        project: project.into(),
        command: CommandLine::shell("true"),
        cwd: PathBuf::from("/tmp"),
        commit: None,
        requester: Requester::new("tester"),
        state: ExecutionState::Pending,
        created_at_ms: 1_000_000,
        started_at_ms: None,
        finished_at_ms: None,
        exit_status: None,
        repo_id: None,
        cancelled_by: None,
        error: None,
    }
}
