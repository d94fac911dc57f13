// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission order, project independence, and the enabled switch

use super::*;
use crate::test_helpers::FlakyRepository;
use sy_adapters::FakeProcessAdapter;
use sy_core::{FakeClock, SequentialIdGen};

#[tokio::test]
async fn idle_project_starts_immediately_and_busy_project_queues() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    let b = start_held(&ctx, "p1", "b").await;

    assert_eq!(a.state, ExecutionState::Running);
    assert!(a.started_at_ms.is_some());
    assert_eq!(b.state, ExecutionState::Pending);
    assert_eq!(
        ctx.engine.queue(&project("p1")),
        QueueSnapshot {
            running: Some(a.id.clone()),
            pending: vec![b.id.clone()],
        }
    );

    ctx.process.release("a");
    let a_done = ctx.engine.wait(&a.id).await.unwrap();
    assert_eq!(a_done.state, ExecutionState::Succeeded);
    assert_eq!(a_done.exit_status, Some(ExitStatus::Code(0)));

    let b_running = wait_for_state(&ctx.engine, &b.id, ExecutionState::Running).await;
    assert!(b_running.started_at_ms >= a_done.finished_at_ms);
    assert_eq!(ctx.process.spawned(), vec!["a", "b"]);

    ctx.process.release("b");
    ctx.engine.wait(&b.id).await.unwrap();
}

#[tokio::test]
async fn same_project_runs_one_at_a_time_in_arrival_order() {
    let ctx = setup();
    let scripts: Vec<String> = (0..5).map(|i| format!("job{i}")).collect();
    let mut ids = Vec::new();
    for script in &scripts {
        ids.push(start_held(&ctx, "p1", script).await.id);
    }

    for (i, script) in scripts.iter().enumerate() {
        let running: Vec<ExecutionId> = ctx
            .engine
            .active()
            .into_iter()
            .filter(|e| e.state == ExecutionState::Running)
            .map(|e| e.id)
            .collect();
        assert_eq!(running, vec![ids[i].clone()]);

        ctx.process.release(script);
        ctx.engine.wait(&ids[i]).await.unwrap();
        if let Some(next) = ids.get(i + 1) {
            wait_for_state(&ctx.engine, next, ExecutionState::Running).await;
        }
    }

    assert_eq!(ctx.process.spawned(), scripts);
    assert!(ctx.engine.active().is_empty());
}

#[tokio::test]
async fn projects_do_not_wait_for_each_other() {
    let ctx = setup();
    let busy = start_held(&ctx, "p1", "long build").await;
    let other = start_held(&ctx, "p2", "quick test").await;

    assert_eq!(busy.state, ExecutionState::Running);
    assert_eq!(other.state, ExecutionState::Running);

    ctx.process.release("quick test");
    let done = ctx.engine.wait(&other.id).await.unwrap();
    assert_eq!(done.state, ExecutionState::Succeeded);
    assert_eq!(
        ctx.engine.execution(&busy.id).unwrap().state,
        ExecutionState::Running
    );

    ctx.process.release("long build");
    ctx.engine.wait(&busy.id).await.unwrap();
}

#[tokio::test]
async fn disabled_engine_rejects_new_work_but_finishes_admitted_work() {
    let ctx = setup();
    let a = start_held(&ctx, "p1", "a").await;
    let b = ctx
        .engine
        .start_execution(shell_request("p1", "b"))
        .await
        .unwrap();

    ctx.engine.set_enabled(false);
    assert!(!ctx.engine.is_enabled());

    let err = ctx
        .engine
        .start_execution(shell_request("p1", "c"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Disabled));
    let err = ctx
        .engine
        .start_execution(shell_request("p9", "d"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Disabled));

    ctx.process.release("a");
    assert_eq!(
        ctx.engine.wait(&a.id).await.unwrap().state,
        ExecutionState::Succeeded
    );
    assert_eq!(
        ctx.engine.wait(&b.id).await.unwrap().state,
        ExecutionState::Succeeded
    );
    assert_eq!(ctx.process.spawned(), vec!["a", "b"]);
    assert_eq!(ctx.repository.len(), 2);

    ctx.engine.set_enabled(true);
    let c = ctx
        .engine
        .start_execution(shell_request("p1", "c"))
        .await
        .unwrap();
    ctx.engine.wait(&c.id).await.unwrap();
}

#[tokio::test]
async fn nonzero_exit_is_failed_not_errored() {
    let ctx = setup();
    ctx.process.script("make test", FakeScript::exits(2));

    let started = ctx
        .engine
        .start_execution(shell_request("p1", "make test"))
        .await
        .unwrap();
    let done = ctx.engine.wait(&started.id).await.unwrap();

    assert_eq!(done.state, ExecutionState::Failed);
    assert_eq!(done.exit_status, Some(ExitStatus::Code(2)));
    assert_eq!(done.error, None);
}

#[tokio::test]
async fn repository_failure_on_create_admits_nothing() {
    let process = FakeProcessAdapter::new();
    let repository = FlakyRepository::new();
    repository.fail_create(true);
    let engine = Engine::with_ids(
        EngineDeps {
            process: process.clone(),
            repository: repository.clone(),
        },
        FakeClock::new(),
        test_config(),
        SequentialIdGen::new("exec"),
    );

    let err = engine
        .start_execution(shell_request("p1", "make"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Repository(_)));
    assert!(engine.active().is_empty());
    assert_eq!(engine.queue(&project("p1")), QueueSnapshot::default());
    assert!(process.calls().is_empty());
}

#[tokio::test]
async fn abandoned_start_request_still_runs_and_frees_the_project() {
    let process = FakeProcessAdapter::new();
    let repository = FlakyRepository::new();
    let engine = Engine::with_ids(
        EngineDeps {
            process: process.clone(),
            repository: repository.clone(),
        },
        FakeClock::new(),
        test_config(),
        SequentialIdGen::new("exec"),
    );
    repository.slow_changes(Some(Duration::from_millis(200)));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        engine.start_execution(shell_request("p1", "a")),
    )
    .await;
    assert!(abandoned.is_err(), "start should still be writing `running`");
    repository.slow_changes(None);

    let b = engine
        .start_execution(shell_request("p1", "b"))
        .await
        .unwrap();
    assert_eq!(b.state, ExecutionState::Pending);

    let a = tokio::time::timeout(Duration::from_secs(5), engine.wait(&ExecutionId::new("exec-1")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.state, ExecutionState::Succeeded);
    let b = tokio::time::timeout(Duration::from_secs(5), engine.wait(&b.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(b.state, ExecutionState::Succeeded);
    assert_eq!(process.spawned(), vec!["a", "b"]);
    eventually(|| engine.queue(&project("p1")) == QueueSnapshot::default()).await;
}

#[tokio::test]
async fn repository_failure_on_state_change_does_not_stall_the_queue() {
    let process = FakeProcessAdapter::new();
    let repository = FlakyRepository::new();
    let engine = Engine::with_ids(
        EngineDeps {
            process: process.clone(),
            repository: repository.clone(),
        },
        FakeClock::new(),
        test_config(),
        SequentialIdGen::new("exec"),
    );
    repository.fail_changes(true);

    let a = engine
        .start_execution(shell_request("p1", "a"))
        .await
        .unwrap();
    let b = engine
        .start_execution(shell_request("p1", "b"))
        .await
        .unwrap();

    assert_eq!(
        engine.wait(&a.id).await.unwrap().state,
        ExecutionState::Succeeded
    );
    assert_eq!(
        engine.wait(&b.id).await.unwrap().state,
        ExecutionState::Succeeded
    );
    let repo_id = a.repo_id.unwrap();
    assert_eq!(
        repository.inner().history(&repo_id),
        vec![ExecutionState::Pending]
    );
}

#[tokio::test]
async fn spawned_process_gets_execution_environment() {
    let ctx = setup();
    let request = shell_request("web", "deploy")
        .with_commit("abc123")
        .with_env("STAGE", "prod");

    let started = ctx.engine.start_execution(request).await.unwrap();
    ctx.engine.wait(&started.id).await.unwrap();

    let env = &ctx.process.calls()[0].spec.env;
    let get = |key: &str| {
        env.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("SY_EXECUTION_ID"), Some("exec-1"));
    assert_eq!(get("SY_PROJECT"), Some("web"));
    assert_eq!(get("SY_COMMIT"), Some("abc123"));
    assert_eq!(get("STAGE"), Some("prod"));
}
