// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::pending_execution;

#[yare::parameterized(
    pending_to_running    = { ExecutionState::Pending, ExecutionState::Running, true },
    pending_to_cancelled  = { ExecutionState::Pending, ExecutionState::Cancelled, true },
    pending_to_errored    = { ExecutionState::Pending, ExecutionState::Errored, true },
    pending_to_succeeded  = { ExecutionState::Pending, ExecutionState::Succeeded, false },
    pending_to_failed     = { ExecutionState::Pending, ExecutionState::Failed, false },
    running_to_succeeded  = { ExecutionState::Running, ExecutionState::Succeeded, true },
    running_to_failed     = { ExecutionState::Running, ExecutionState::Failed, true },
    running_to_cancelled  = { ExecutionState::Running, ExecutionState::Cancelled, true },
    running_to_errored    = { ExecutionState::Running, ExecutionState::Errored, true },
    running_to_pending    = { ExecutionState::Running, ExecutionState::Pending, false },
    running_to_running    = { ExecutionState::Running, ExecutionState::Running, false },
    succeeded_to_failed   = { ExecutionState::Succeeded, ExecutionState::Failed, false },
    failed_to_running     = { ExecutionState::Failed, ExecutionState::Running, false },
    cancelled_to_errored  = { ExecutionState::Cancelled, ExecutionState::Errored, false },
    errored_to_cancelled  = { ExecutionState::Errored, ExecutionState::Cancelled, false },
)]
fn lifecycle_edges(from: ExecutionState, to: ExecutionState, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn terminal_states() {
    assert!(!ExecutionState::Pending.is_terminal());
    assert!(!ExecutionState::Running.is_terminal());
    assert!(ExecutionState::Succeeded.is_terminal());
    assert!(ExecutionState::Failed.is_terminal());
    assert!(ExecutionState::Cancelled.is_terminal());
    assert!(ExecutionState::Errored.is_terminal());
}

#[test]
fn apply_running_records_start_time() {
    let mut exec = pending_execution("exec-1", "p1");
    exec.apply(Transition::to(ExecutionState::Running), 2_000)
        .unwrap();

    assert_eq!(exec.state, ExecutionState::Running);
    assert_eq!(exec.started_at_ms, Some(2_000));
    assert_eq!(exec.finished_at_ms, None);
}

#[test]
fn apply_terminal_records_finish_and_exit() {
    let mut exec = pending_execution("exec-1", "p1");
    exec.apply(Transition::to(ExecutionState::Running), 2_000)
        .unwrap();
    exec.apply(
        Transition::to(ExecutionState::Failed).with_exit(ExitStatus::Code(3)),
        5_500,
    )
    .unwrap();

    assert_eq!(exec.state, ExecutionState::Failed);
    assert_eq!(exec.finished_at_ms, Some(5_500));
    assert_eq!(exec.exit_status, Some(ExitStatus::Code(3)));
    assert_eq!(exec.duration_ms(), Some(3_500));
}

#[test]
fn apply_illegal_transition_leaves_record_untouched() {
    let mut exec = pending_execution("exec-1", "p1");
    exec.apply(Transition::to(ExecutionState::Cancelled), 2_000)
        .unwrap();
    let before = exec.clone();

    let err = exec
        .apply(
            Transition::to(ExecutionState::Succeeded).with_exit(ExitStatus::Code(0)),
            3_000,
        )
        .unwrap_err();

    assert_eq!(err.from, ExecutionState::Cancelled);
    assert_eq!(err.to, ExecutionState::Succeeded);
    assert_eq!(exec, before);
    assert_eq!(
        err.to_string(),
        "illegal state transition for exec-1: cancelled -> succeeded"
    );
}

#[test]
fn cancel_records_who_cancelled() {
    let mut exec = pending_execution("exec-1", "p1");
    exec.apply(
        Transition::to(ExecutionState::Cancelled).cancelled_by(Some(Requester::new("alice"))),
        2_000,
    )
    .unwrap();

    assert_eq!(exec.cancelled_by, Some(Requester::new("alice")));
    assert_eq!(exec.started_at_ms, None);
    assert_eq!(exec.duration_ms(), None);
}

#[test]
fn exit_status_success_only_for_code_zero() {
    assert!(ExitStatus::Code(0).success());
    assert!(!ExitStatus::Code(1).success());
    assert!(!ExitStatus::Signal(9).success());
    assert_eq!(ExitStatus::Signal(15).code(), None);
    assert_eq!(ExitStatus::Code(2).to_string(), "exit 2");
    assert_eq!(ExitStatus::Signal(9).to_string(), "signal 9");
}

#[test]
fn state_serializes_snake_case() {
    let json = serde_json::to_string(&ExecutionState::Cancelled).unwrap();
    assert_eq!(json, "\"cancelled\"");
}
