// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation of pending and running executions

use super::*;
use sy_adapters::ControlSignal;

#[tokio::test]
async fn cancel_pending_never_spawns_and_keeps_queue_order() {
    let ctx = setup();
    start_held(&ctx, "p1", "a").await;
    let b = start_held(&ctx, "p1", "b").await;
    let c = start_held(&ctx, "p1", "c").await;

    ctx.engine
        .cancel_execution(&b.id, Requester::new("alice"))
        .await
        .unwrap();

    let cancelled = ctx.engine.execution(&b.id).unwrap();
    assert_eq!(cancelled.state, ExecutionState::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(Requester::new("alice")));
    assert_eq!(cancelled.started_at_ms, None);
    assert!(ctx.engine.subscribe(&b.id).unwrap().next().await.is_none());
    assert_eq!(ctx.engine.queue(&project("p1")).pending, vec![c.id.clone()]);

    ctx.process.release("a");
    wait_for_state(&ctx.engine, &c.id, ExecutionState::Running).await;
    ctx.process.release("c");
    ctx.engine.wait(&c.id).await.unwrap();

    assert_eq!(ctx.process.spawned(), vec!["a", "c"]);
    assert_eq!(
        ctx.repository.history(&cancelled.repo_id.unwrap()),
        vec![ExecutionState::Pending, ExecutionState::Cancelled]
    );
}

#[tokio::test]
async fn cancel_running_terminates_gracefully() {
    let ctx = setup();
    let running = start_held(&ctx, "p1", "serve").await;

    ctx.engine
        .cancel_execution(&running.id, Requester::new("bob"))
        .await
        .unwrap();
    let done = ctx.engine.wait(&running.id).await.unwrap();

    assert_eq!(done.state, ExecutionState::Cancelled);
    assert_eq!(done.exit_status, Some(ExitStatus::Signal(15)));
    assert_eq!(done.cancelled_by, Some(Requester::new("bob")));
    assert_eq!(ctx.process.signals("serve"), vec![ControlSignal::Terminate]);
}

#[tokio::test]
async fn cancel_running_kills_after_grace_period() {
    let ctx = setup();
    ctx.process.script(
        "stubborn",
        FakeScript::exits(0).output(["working\n"]).ignoring_terminate(),
    );
    let running = ctx
        .engine
        .start_execution(shell_request("p1", "stubborn"))
        .await
        .unwrap();

    ctx.engine
        .cancel_execution(&running.id, Requester::new("bob"))
        .await
        .unwrap();
    let done = ctx.engine.wait(&running.id).await.unwrap();

    assert_eq!(done.state, ExecutionState::Cancelled);
    assert_eq!(done.exit_status, Some(ExitStatus::Signal(9)));
    assert_eq!(
        ctx.process.signals("stubborn"),
        vec![ControlSignal::Terminate, ControlSignal::Kill]
    );
    let sub = ctx.engine.subscribe(&running.id).unwrap();
    assert_eq!(sub.read_to_end().await, "working\n");
}

#[tokio::test]
async fn cancelled_running_execution_promotes_the_next() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    let b = start_held(&ctx, "p1", "b").await;

    ctx.engine
        .cancel_execution(&a.id, Requester::new("bob"))
        .await
        .unwrap();

    wait_for_state(&ctx.engine, &b.id, ExecutionState::Running).await;
    assert_eq!(
        ctx.engine.execution(&a.id).unwrap().state,
        ExecutionState::Cancelled
    );
    ctx.process.release("b");
    ctx.engine.wait(&b.id).await.unwrap();
}

#[tokio::test]
async fn repeated_cancel_of_running_execution_is_accepted() {
    let ctx = setup();
    let running = start_held(&ctx, "p1", "serve").await;

    ctx.engine
        .cancel_execution(&running.id, Requester::new("alice"))
        .await
        .unwrap();
    let second = ctx
        .engine
        .cancel_execution(&running.id, Requester::new("bob"))
        .await;

    // Either still shutting down, or already finished
    assert!(matches!(
        second,
        Ok(()) | Err(EngineError::AlreadyTerminal { .. })
    ));
    let done = ctx.engine.wait(&running.id).await.unwrap();
    assert_eq!(done.cancelled_by, Some(Requester::new("alice")));
}

#[tokio::test]
async fn cancel_unknown_execution_is_not_found() {
    let ctx = setup();
    let err = ctx
        .engine
        .cancel_execution(&ExecutionId::new("nope"), Requester::new("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(id) if id == "nope"));
}

#[tokio::test]
async fn cancel_finished_execution_reports_terminal_state() {
    let ctx = setup();
    let started = ctx
        .engine
        .start_execution(shell_request("p1", "true"))
        .await
        .unwrap();
    ctx.engine.wait(&started.id).await.unwrap();

    let err = ctx
        .engine
        .cancel_execution(&started.id, Requester::new("alice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::AlreadyTerminal {
            state: ExecutionState::Succeeded,
            ..
        }
    ));
    let unchanged = ctx.engine.execution(&started.id).unwrap();
    assert_eq!(unchanged.state, ExecutionState::Succeeded);
    assert_eq!(unchanged.cancelled_by, None);
}

#[tokio::test]
async fn shutdown_cancels_everything_and_disables() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    let b = start_held(&ctx, "p1", "b").await;
    let c = start_held(&ctx, "p2", "c").await;

    ctx.engine.shutdown().await;

    assert!(!ctx.engine.is_enabled());
    assert!(ctx.engine.active().is_empty());
    for id in [&a.id, &b.id, &c.id] {
        let execution = ctx.engine.execution(id).unwrap();
        assert_eq!(execution.state, ExecutionState::Cancelled);
        assert_eq!(
            execution.cancelled_by,
            Some(Requester::new(SYSTEM_REQUESTER))
        );
    }
    assert_eq!(ctx.process.spawned(), vec!["a", "c"]);
}
