// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: child processes and the durable job store

pub mod process;
pub mod repository;
pub mod traced;

pub use process::{
    ControlSignal, ExitWaiter, LocalProcessAdapter, OutputStream, ProcessAdapter,
    ProcessControl, ProcessError, ProcessHandle, SpawnError, SpawnSpec,
};
pub use repository::{JobRepository, MemoryJobRepository, RepositoryError, StateChange};
pub use traced::{TracedProcess, TracedRepository};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessAdapter, FakeScript, SpawnCall};
