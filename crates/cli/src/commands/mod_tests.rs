// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sy_core::test_support::pending_execution;

fn ended(state: ExecutionState, exit: Option<ExitStatus>) -> Execution {
    let mut execution = pending_execution("exec-1", "web");
    execution.state = state;
    execution.exit_status = exit;
    execution
}

#[yare::parameterized(
    succeeded          = { ExecutionState::Succeeded, Some(ExitStatus::Code(0)), 0 },
    failed_code        = { ExecutionState::Failed, Some(ExitStatus::Code(3)), 3 },
    failed_signal      = { ExecutionState::Failed, Some(ExitStatus::Signal(9)), 137 },
    cancelled_term     = { ExecutionState::Cancelled, Some(ExitStatus::Signal(15)), 143 },
    cancelled_pending  = { ExecutionState::Cancelled, None, 130 },
    cancelled_clean    = { ExecutionState::Cancelled, Some(ExitStatus::Code(0)), 130 },
    errored            = { ExecutionState::Errored, None, 1 },
)]
fn exit_code_mirrors_job(state: ExecutionState, exit: Option<ExitStatus>, expected: i32) {
    assert_eq!(exit_code(&ended(state, exit)), expected);
}

#[test]
fn finish_succeeded_is_ok() {
    assert!(finish(&ended(ExecutionState::Succeeded, Some(ExitStatus::Code(0)))).is_ok());
}

#[test]
fn finish_failed_exits_quietly_with_job_code() {
    let err = finish(&ended(ExecutionState::Failed, Some(ExitStatus::Code(2)))).unwrap_err();
    let exit = err.downcast_ref::<ExitError>().unwrap();
    assert_eq!(exit.code, 2);
    assert!(exit.message.is_empty());
}

#[test]
fn finish_errored_reports_error() {
    let mut execution = ended(ExecutionState::Errored, None);
    execution.error = Some("command not found: nope".to_string());

    let err = finish(&execution).unwrap_err();

    let exit = err.downcast_ref::<ExitError>().unwrap();
    assert_eq!(exit.code, 1);
    assert_eq!(exit.message, "job errored: command not found: nope");
}

#[test]
fn finish_cancelled_says_so() {
    let err = finish(&ended(ExecutionState::Cancelled, None)).unwrap_err();
    assert_eq!(err.to_string(), "job cancelled");
}
