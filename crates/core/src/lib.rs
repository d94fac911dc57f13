// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sy-core: domain types for the Shipyard job execution engine

pub mod clock;
pub mod execution;
pub mod id;
pub mod runnable;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use execution::{Execution, ExecutionState, ExitStatus, Transition, TransitionError};
pub use id::{ExecutionId, IdGen, ProjectKey, RepoId, Requester, SequentialIdGen, UuidIdGen};
pub use runnable::{CommandLine, DeployCommand, ExecutionRequest, JobCommand, Runnable};
