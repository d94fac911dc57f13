// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod batch;
pub mod run;

use crate::env;
use crate::exit_error::ExitError;
use sy_adapters::{LocalProcessAdapter, MemoryJobRepository, TracedProcess, TracedRepository};
use sy_core::{Execution, ExecutionState, ExitStatus, SystemClock};
use sy_engine::{Engine, EngineConfig, EngineDeps};

/// Engine wired to real processes and an in-memory job store
pub(crate) type CliEngine = Engine<
    TracedProcess<LocalProcessAdapter>,
    TracedRepository<MemoryJobRepository>,
    SystemClock,
>;

pub(crate) fn build_engine() -> CliEngine {
    let process = match env::shell() {
        Some(shell) => LocalProcessAdapter::with_shell(shell),
        None => LocalProcessAdapter::new(),
    };
    Engine::new(
        EngineDeps {
            process: TracedProcess::new(process),
            repository: TracedRepository::new(MemoryJobRepository::new()),
        },
        SystemClock,
        EngineConfig::from_env(),
    )
}

/// Exit code that mirrors how a job ended.
///
/// A job killed by a signal maps to 128 + signal, like a shell does; a
/// cancelled job that never ran maps to 130.
pub(crate) fn exit_code(execution: &Execution) -> i32 {
    match (execution.state, execution.exit_status) {
        (ExecutionState::Succeeded, _) => 0,
        (_, Some(ExitStatus::Code(code))) if code != 0 => code,
        (_, Some(ExitStatus::Signal(signal))) => 128 + signal,
        (ExecutionState::Cancelled, _) => 130,
        _ => 1,
    }
}

/// Turn a finished execution into the CLI's result.
pub(crate) fn finish(execution: &Execution) -> anyhow::Result<()> {
    let code = exit_code(execution);
    if code == 0 {
        return Ok(());
    }
    let message = match execution.state {
        ExecutionState::Errored => format!(
            "job errored: {}",
            execution.error.as_deref().unwrap_or("unknown error")
        ),
        ExecutionState::Cancelled => "job cancelled".to_string(),
        _ => String::new(),
    };
    Err(ExitError::new(code, message).into())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
