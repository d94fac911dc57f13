// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution workers.
//!
//! A worker owns the project's running slot: it spawns the execution's
//! process, pumps its output into the broadcaster, honors cancellation with
//! SIGTERM then SIGKILL after the grace period, records the terminal state,
//! and then moves on to whatever the dispatcher promotes next. No lock is
//! held across any of this I/O.

use crate::engine::Engine;
use crate::machine::{CancelFlag, ExecutionMachine};
use std::sync::Arc;
use sy_adapters::{JobRepository, ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec};
use sy_core::{Clock, ExecutionState, ExitStatus, Requester, Transition};
use tokio::time::{sleep_until, Instant};

impl<P, R, C> Engine<P, R, C>
where
    P: ProcessAdapter,
    R: JobRepository,
    C: Clock,
{
    /// Run `machine` (already started, if `handle` is set) and then every
    /// execution promoted behind it, until the project's queue is empty.
    pub(crate) async fn drive(self, machine: Arc<ExecutionMachine>, handle: Option<ProcessHandle>) {
        let mut machine = machine;
        let mut handle = handle;
        loop {
            if let Some(handle) = handle.take() {
                self.supervise(&machine, handle).await;
            }
            let Some(next) = self.advance(&machine) else {
                return;
            };
            machine = next;
            handle = self.start(&machine).await;
        }
    }

    /// Move a promoted execution to `running`.
    ///
    /// Returns the process handle, or `None` when the execution went
    /// straight to a terminal state instead (cancelled before it could
    /// start, or the spawn failed).
    pub(crate) async fn start(&self, machine: &ExecutionMachine) -> Option<ProcessHandle> {
        if let Some(by) = machine.cancel_requested() {
            self.finish(
                machine,
                Transition::to(ExecutionState::Cancelled).cancelled_by(Some(by)),
            )
            .await;
            return None;
        }

        let execution = machine.snapshot();
        let mut spec = SpawnSpec::new(execution.command.clone(), execution.cwd.clone());
        spec.env.push(("SY_EXECUTION_ID".to_string(), execution.id.to_string()));
        spec.env.push(("SY_PROJECT".to_string(), execution.project.to_string()));
        if let Some(commit) = &execution.commit {
            spec.env.push(("SY_COMMIT".to_string(), commit.clone()));
        }
        spec.env.extend(machine.env().iter().cloned());

        match self.inner.process.spawn(&spec).await {
            Ok(handle) => {
                let running = machine
                    .transition(
                        &self.inner.repository,
                        &self.inner.clock,
                        Transition::to(ExecutionState::Running),
                    )
                    .await;
                match running {
                    Ok(_) => Some(handle),
                    Err(_) => {
                        handle.kill();
                        None
                    }
                }
            }
            Err(e) => {
                self.finish(
                    machine,
                    Transition::to(ExecutionState::Errored).with_error(e.to_string()),
                )
                .await;
                None
            }
        }
    }

    /// Supervise a running execution until its process exits.
    ///
    /// Output is read until the pipes close. If the process exits while
    /// descendants still hold them, output is drained for at most the kill
    /// grace period before the rest of the group is killed.
    async fn supervise(&self, machine: &ExecutionMachine, handle: ProcessHandle) {
        let id = machine.id();
        let grace = self.inner.config.kill_grace;
        let (mut output, mut exit, control) = handle.into_parts();

        let mut cancel_rx = machine.cancel_watch();
        let mut cancelled_by: Option<Requester> = match &*cancel_rx.borrow_and_update() {
            CancelFlag::Requested(by) => Some(by.clone()),
            CancelFlag::Clear => None,
        };
        let mut kill_at = None;
        if cancelled_by.is_some() {
            control.terminate();
            kill_at = Some(Instant::now() + grace);
        }

        let mut output_open = true;
        let mut cancel_open = true;
        let mut exited: Option<Result<ExitStatus, ProcessError>> = None;
        let mut drain_until = None;
        let result: Result<ExitStatus, ProcessError> = loop {
            if !output_open {
                if let Some(result) = exited.take() {
                    break result;
                }
            }
            tokio::select! {
                chunk = output.next_chunk(), if output_open => match chunk {
                    Some(text) => {
                        machine.output().publish(text);
                    }
                    None => output_open = false,
                },
                result = exit.wait(), if exited.is_none() => {
                    exited = Some(result);
                    drain_until = Some(Instant::now() + grace);
                }
                changed = cancel_rx.changed(), if cancel_open && cancelled_by.is_none() => {
                    match changed {
                        Ok(()) => {
                            let flag = cancel_rx.borrow_and_update().clone();
                            if let CancelFlag::Requested(by) = flag {
                                tracing::info!(execution_id = %id, requester = %by, "terminating");
                                cancelled_by = Some(by);
                                control.terminate();
                                kill_at = Some(Instant::now() + grace);
                            }
                        }
                        Err(_) => cancel_open = false,
                    }
                }
                () = sleep_until(kill_at.unwrap_or_else(Instant::now)), if kill_at.is_some() => {
                    tracing::warn!(
                        execution_id = %id,
                        grace_ms = grace.as_millis() as u64,
                        "still running after grace period, killing"
                    );
                    control.kill();
                    kill_at = None;
                }
                () = sleep_until(drain_until.unwrap_or_else(Instant::now)), if drain_until.is_some() && output_open => {
                    // Leftover descendants keep the pipes open; the job is over
                    tracing::warn!(
                        execution_id = %id,
                        grace_ms = grace.as_millis() as u64,
                        "output still open after exit, killing process group"
                    );
                    control.kill();
                    output_open = false;
                    drain_until = None;
                }
            }
        };

        let transition = match (result, cancelled_by) {
            (Ok(status), Some(by)) => Transition::to(ExecutionState::Cancelled)
                .with_exit(status)
                .cancelled_by(Some(by)),
            (Err(e), Some(by)) => Transition::to(ExecutionState::Cancelled)
                .with_error(e.to_string())
                .cancelled_by(Some(by)),
            (Ok(status), None) if status.success() => {
                Transition::to(ExecutionState::Succeeded).with_exit(status)
            }
            (Ok(status), None) => Transition::to(ExecutionState::Failed).with_exit(status),
            (Err(e), None) => Transition::to(ExecutionState::Errored).with_error(e.to_string()),
        };
        self.finish(machine, transition).await;
    }

    /// Release the slot held by `machine` and return the execution promoted
    /// into it, if any.
    fn advance(&self, machine: &ExecutionMachine) -> Option<Arc<ExecutionMachine>> {
        let project = machine.project();
        let mut holder = machine.id();
        loop {
            let next = self.inner.dispatcher.complete(&project, &holder)?;
            match self.lookup(&next) {
                Some(next) => return Some(next),
                None => {
                    tracing::error!(%project, execution_id = %next, "promoted execution is gone, skipping");
                    holder = next;
                }
            }
        }
    }
}
