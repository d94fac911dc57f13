// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn failures, bookkeeping, and retention

use super::*;

#[yare::parameterized(
    clean_exit    = { ExitStatus::Code(0), ExecutionState::Succeeded },
    test_failure  = { ExitStatus::Code(1), ExecutionState::Failed },
    segfault_code = { ExitStatus::Code(139), ExecutionState::Failed },
    oom_killed    = { ExitStatus::Signal(9), ExecutionState::Failed },
)]
#[test_macro(tokio::test)]
async fn exit_status_decides_terminal_state(exit: ExitStatus, expected: ExecutionState) {
    let ctx = setup();
    ctx.process.script(
        "job",
        FakeScript {
            exit,
            ..FakeScript::default()
        },
    );

    let started = ctx
        .engine
        .start_execution(shell_request("p1", "job"))
        .await
        .unwrap();
    let done = ctx.engine.wait(&started.id).await.unwrap();

    assert_eq!(done.state, expected);
    assert_eq!(done.exit_status, Some(exit));
    assert_eq!(done.cancelled_by, None);
}

#[tokio::test]
async fn spawn_failure_errors_without_running() {
    let ctx = setup();
    ctx.process
        .fail_spawn("ghost", SpawnError::NotFound("ghost".to_string()));

    let errored = ctx
        .engine
        .start_execution(shell_request("p1", "ghost"))
        .await
        .unwrap();

    assert_eq!(errored.state, ExecutionState::Errored);
    assert_eq!(errored.started_at_ms, None);
    assert_eq!(errored.error.as_deref(), Some("executable not found: ghost"));
    assert_eq!(
        ctx.repository.history(&errored.repo_id.unwrap()),
        vec![ExecutionState::Pending, ExecutionState::Errored]
    );
    assert_eq!(ctx.engine.transcript(&errored.id).unwrap(), "");
}

#[tokio::test]
async fn spawn_failure_still_promotes_the_next_execution() {
    let ctx = setup();
    ctx.process
        .fail_spawn("ghost", SpawnError::NotFound("ghost".to_string()));
    start_held(&ctx, "p1", "a").await;
    let ghost = ctx
        .engine
        .start_execution(shell_request("p1", "ghost"))
        .await
        .unwrap();
    let b = start_held(&ctx, "p1", "b").await;
    assert_eq!(ghost.state, ExecutionState::Pending);

    ctx.process.release("a");

    wait_for_state(&ctx.engine, &b.id, ExecutionState::Running).await;
    assert_eq!(
        ctx.engine.execution(&ghost.id).unwrap().state,
        ExecutionState::Errored
    );
    ctx.process.release("b");
    ctx.engine.wait(&b.id).await.unwrap();
}

#[tokio::test]
async fn execution_records_timestamps_from_clock() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    assert_eq!(a.created_at_ms, 1_000_000);
    assert_eq!(a.started_at_ms, Some(1_000_000));

    ctx.clock.advance(Duration::from_secs(3));
    ctx.process.release("a");
    let done = ctx.engine.wait(&a.id).await.unwrap();

    assert_eq!(done.finished_at_ms, Some(1_003_000));
    assert_eq!(done.duration_ms(), Some(3_000));
}

#[tokio::test]
async fn repository_sees_every_transition() {
    let ctx = setup();
    ctx.process.script("lint", FakeScript::exits(1));
    let started = ctx
        .engine
        .start_execution(shell_request("p1", "lint"))
        .await
        .unwrap();
    ctx.engine.wait(&started.id).await.unwrap();

    let repo_id = started.repo_id.unwrap();
    eventually(|| ctx.repository.history(&repo_id).len() == 3).await;
    assert_eq!(
        ctx.repository.history(&repo_id),
        vec![
            ExecutionState::Pending,
            ExecutionState::Running,
            ExecutionState::Failed
        ]
    );
}

#[tokio::test]
async fn active_lists_pending_and_running_oldest_first() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    ctx.clock.advance(Duration::from_millis(1));
    let b = start_held(&ctx, "p1", "b").await;
    ctx.clock.advance(Duration::from_millis(1));
    let c = start_held(&ctx, "p2", "c").await;

    let active: Vec<(ExecutionId, ExecutionState)> = ctx
        .engine
        .active()
        .into_iter()
        .map(|e| (e.id, e.state))
        .collect();
    assert_eq!(
        active,
        vec![
            (a.id.clone(), ExecutionState::Running),
            (b.id.clone(), ExecutionState::Pending),
            (c.id.clone(), ExecutionState::Running),
        ]
    );

    ctx.engine.shutdown().await;
}

#[tokio::test]
async fn finished_executions_beyond_retention_are_forgotten() {
    let ctx = setup_with(EngineConfig {
        retain_finished: 1,
        ..test_config()
    });
    let first = ctx
        .engine
        .start_execution(shell_request("p1", "one"))
        .await
        .unwrap();
    ctx.engine.wait(&first.id).await.unwrap();
    let second = ctx
        .engine
        .start_execution(shell_request("p1", "two"))
        .await
        .unwrap();
    ctx.engine.wait(&second.id).await.unwrap();

    eventually(|| ctx.engine.execution(&first.id).is_none()).await;
    assert!(matches!(
        ctx.engine.wait(&first.id).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(ctx.engine.execution(&second.id).is_some());

    // Durable record outlives the in-memory one
    assert_eq!(ctx.repository.len(), 2);
}

#[tokio::test]
async fn wait_on_finished_execution_returns_immediately() {
    let ctx = setup();
    let started = ctx
        .engine
        .start_execution(shell_request("p1", "true"))
        .await
        .unwrap();
    let first = ctx.engine.wait(&started.id).await.unwrap();
    let again = ctx.engine.wait(&started.id).await.unwrap();
    assert_eq!(first, again);
}
