// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sy_core::test_support::pending_execution;
use sy_core::{ExitStatus, Transition};

#[tokio::test]
async fn created_record_is_findable() {
    let repo = MemoryJobRepository::new();
    let exec = pending_execution("exec-1", "p1");

    let id = repo.record_created(&exec).await.unwrap();
    let found = repo.find(&id).await.unwrap();

    assert_eq!(id, "job-1");
    assert_eq!(found.id, exec.id);
    assert_eq!(found.repo_id, Some(id.clone()));
    assert_eq!(found.state, ExecutionState::Pending);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn state_changes_update_record_and_history() {
    let repo = MemoryJobRepository::new();
    let mut exec = pending_execution("exec-1", "p1");
    let id = repo.record_created(&exec).await.unwrap();

    exec.apply(Transition::to(ExecutionState::Running), 2_000)
        .unwrap();
    repo.record_state_change(&id, &StateChange::from(&exec))
        .await
        .unwrap();
    exec.apply(
        Transition::to(ExecutionState::Succeeded).with_exit(ExitStatus::Code(0)),
        3_000,
    )
    .unwrap();
    repo.record_state_change(&id, &StateChange::from(&exec))
        .await
        .unwrap();

    let found = repo.find(&id).await.unwrap();
    assert_eq!(found.state, ExecutionState::Succeeded);
    assert_eq!(found.started_at_ms, Some(2_000));
    assert_eq!(found.finished_at_ms, Some(3_000));
    assert_eq!(found.exit_status, Some(ExitStatus::Code(0)));
    assert_eq!(
        repo.history(&id),
        vec![
            ExecutionState::Pending,
            ExecutionState::Running,
            ExecutionState::Succeeded
        ]
    );
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let repo = MemoryJobRepository::new();
    let id = RepoId::new("job-99");

    assert_eq!(
        repo.find(&id).await.unwrap_err(),
        RepositoryError::NotFound(id.clone())
    );
    let change = StateChange::from(&pending_execution("exec-1", "p1"));
    assert!(repo.record_state_change(&id, &change).await.is_err());
}
