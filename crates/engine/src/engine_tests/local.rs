// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end runs against real processes

use super::*;
use sy_adapters::{LocalProcessAdapter, MemoryJobRepository};
use sy_core::{CommandLine, SequentialIdGen, SystemClock};
use tempfile::TempDir;

type LocalEngine = Engine<LocalProcessAdapter, MemoryJobRepository, SystemClock>;

fn local_engine(kill_grace: Duration) -> LocalEngine {
    Engine::with_ids(
        EngineDeps {
            process: LocalProcessAdapter::new(),
            repository: MemoryJobRepository::new(),
        },
        SystemClock,
        EngineConfig {
            kill_grace,
            ..EngineConfig::default()
        },
        SequentialIdGen::new("exec"),
    )
}

fn request(dir: &TempDir, command: CommandLine) -> ExecutionRequest {
    ExecutionRequest::new("local", command, dir.path(), "tester")
}

#[tokio::test]
async fn shell_command_output_and_exit_code() {
    let dir = TempDir::new().unwrap();
    let engine = local_engine(Duration::from_secs(5));

    let started = engine
        .start_execution(request(
            &dir,
            CommandLine::shell("echo building\necho oops >&2\nexit 3"),
        ))
        .await
        .unwrap();
    let done = engine.wait(&started.id).await.unwrap();

    assert_eq!(done.state, ExecutionState::Failed);
    assert_eq!(done.exit_status, Some(ExitStatus::Code(3)));
    let transcript = engine.transcript(&started.id).unwrap();
    assert!(transcript.contains("building\n"), "{transcript}");
    assert!(transcript.contains("oops\n"), "{transcript}");
}

#[tokio::test]
async fn command_runs_in_working_directory_with_engine_env() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let engine = local_engine(Duration::from_secs(5));

    let started = engine
        .start_execution(request(
            &dir,
            CommandLine::shell("cat marker.txt; echo; echo $SY_PROJECT $SY_EXECUTION_ID"),
        ))
        .await
        .unwrap();
    let done = engine.wait(&started.id).await.unwrap();

    assert_eq!(done.state, ExecutionState::Succeeded);
    assert_eq!(
        engine.transcript(&started.id).unwrap(),
        "here\nlocal exec-1\n"
    );
}

#[tokio::test]
async fn missing_executable_errors_and_next_job_runs() {
    let dir = TempDir::new().unwrap();
    let engine = local_engine(Duration::from_secs(5));

    let missing = engine
        .start_execution(request(
            &dir,
            CommandLine::exec("definitely-not-a-real-binary-sy", Vec::<String>::new()),
        ))
        .await
        .unwrap();
    let next = engine
        .start_execution(request(&dir, CommandLine::shell("echo after")))
        .await
        .unwrap();

    assert_eq!(missing.state, ExecutionState::Errored);
    assert!(missing
        .error
        .as_deref()
        .is_some_and(|e| e.contains("definitely-not-a-real-binary-sy")));
    let done = engine.wait(&next.id).await.unwrap();
    assert_eq!(done.state, ExecutionState::Succeeded);
    assert_eq!(engine.transcript(&next.id).unwrap(), "after\n");
}

#[tokio::test]
async fn cancel_kills_process_that_ignores_sigterm() {
    let dir = TempDir::new().unwrap();
    let engine = local_engine(Duration::from_millis(200));

    let started = engine
        .start_execution(request(
            &dir,
            CommandLine::shell("trap '' TERM\necho ready\nwhile true; do sleep 0.05; done"),
        ))
        .await
        .unwrap();
    let mut sub = engine.subscribe(&started.id).unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&*first.text, "ready\n");

    engine
        .cancel_execution(&started.id, Requester::new("tester"))
        .await
        .unwrap();
    let done = tokio::time::timeout(Duration::from_secs(10), engine.wait(&started.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(done.state, ExecutionState::Cancelled);
    assert_eq!(done.exit_status, Some(ExitStatus::Signal(9)));
    assert!(tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn background_descendant_does_not_hold_the_project() {
    let dir = TempDir::new().unwrap();
    let engine = local_engine(Duration::from_millis(50));

    let started = engine
        .start_execution(request(&dir, CommandLine::shell("sleep 20 &\necho hi\nexit 0")))
        .await
        .unwrap();
    let next = engine
        .start_execution(request(&dir, CommandLine::shell("echo next")))
        .await
        .unwrap();
    assert_eq!(next.state, ExecutionState::Pending);

    let done = tokio::time::timeout(Duration::from_secs(5), engine.wait(&started.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.state, ExecutionState::Succeeded);
    assert_eq!(done.exit_status, Some(ExitStatus::Code(0)));
    assert_eq!(engine.transcript(&started.id).unwrap(), "hi\n");

    let after = tokio::time::timeout(Duration::from_secs(5), engine.wait(&next.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.state, ExecutionState::Succeeded);
    assert_eq!(engine.transcript(&next.id).unwrap(), "next\n");
}

#[tokio::test]
async fn cancel_reaches_descendants_of_a_running_shell() {
    let dir = TempDir::new().unwrap();
    let engine = local_engine(Duration::from_millis(200));

    let started = engine
        .start_execution(request(
            &dir,
            CommandLine::shell("sleep 20 &\necho ready\nwait"),
        ))
        .await
        .unwrap();
    let mut sub = engine.subscribe(&started.id).unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&*first.text, "ready\n");

    engine
        .cancel_execution(&started.id, Requester::new("tester"))
        .await
        .unwrap();
    let done = tokio::time::timeout(Duration::from_secs(5), engine.wait(&started.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(done.state, ExecutionState::Cancelled);
    assert_eq!(done.cancelled_by, Some(Requester::new("tester")));
    eventually(|| engine.queue(&started.project) == QueueSnapshot::default()).await;
}
