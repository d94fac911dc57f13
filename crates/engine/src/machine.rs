// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live state of one execution.
//!
//! All lifecycle changes go through [`ExecutionMachine::transition`], which
//! validates the edge, applies it atomically, closes the output when the new
//! state is terminal, and then reports the change to the job repository.

use crate::output::OutputChannel;
use sy_adapters::{JobRepository, StateChange};
use sy_core::{
    Clock, Execution, ExecutionId, ExecutionState, ProjectKey, Requester, Transition,
    TransitionError,
};
use tokio::sync::watch;

/// Cancellation request as seen by the execution's worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum CancelFlag {
    #[default]
    Clear,
    Requested(Requester),
}

pub(crate) struct ExecutionMachine {
    state: watch::Sender<Execution>,
    cancel: watch::Sender<CancelFlag>,
    output: OutputChannel,
    /// Extra environment for the spawned process
    env: Vec<(String, String)>,
}

impl ExecutionMachine {
    pub(crate) fn new(execution: Execution, output_backlog: usize) -> Self {
        let (state, _) = watch::channel(execution);
        let (cancel, _) = watch::channel(CancelFlag::Clear);
        Self {
            state,
            cancel,
            output: OutputChannel::new(output_backlog),
            env: Vec::new(),
        }
    }

    pub(crate) fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub(crate) fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub(crate) fn id(&self) -> ExecutionId {
        self.state.borrow().id.clone()
    }

    pub(crate) fn project(&self) -> ProjectKey {
        self.state.borrow().project.clone()
    }

    pub(crate) fn snapshot(&self) -> Execution {
        self.state.borrow().clone()
    }

    pub(crate) fn state(&self) -> ExecutionState {
        self.state.borrow().state
    }

    pub(crate) fn output(&self) -> &OutputChannel {
        &self.output
    }

    /// Receiver that observes every state change
    pub(crate) fn watch(&self) -> watch::Receiver<Execution> {
        self.state.subscribe()
    }

    /// Wait until the execution reaches a terminal state.
    pub(crate) async fn finished(&self) -> Execution {
        let mut rx = self.watch();
        // The sender lives in `self`, so the channel cannot close under us
        let done = rx
            .wait_for(Execution::is_terminal)
            .await
            .map(|execution| execution.clone());
        done.unwrap_or_else(|_| self.snapshot())
    }

    /// Record a cancel request.
    ///
    /// Returns whether this call recorded it (false if one already was), or
    /// the terminal state the execution had already reached. The check and
    /// the write happen under the state lock, so they cannot straddle a
    /// terminal transition.
    pub(crate) fn request_cancel(&self, requester: Requester) -> Result<bool, ExecutionState> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|execution| {
            outcome = if execution.is_terminal() {
                Err(execution.state)
            } else {
                Ok(self.cancel.send_if_modified(|flag| match flag {
                    CancelFlag::Clear => {
                        *flag = CancelFlag::Requested(requester);
                        true
                    }
                    CancelFlag::Requested(_) => false,
                }))
            };
            false
        });
        outcome
    }

    pub(crate) fn cancel_requested(&self) -> Option<Requester> {
        match &*self.cancel.borrow() {
            CancelFlag::Requested(by) => Some(by.clone()),
            CancelFlag::Clear => None,
        }
    }

    pub(crate) fn cancel_watch(&self) -> watch::Receiver<CancelFlag> {
        self.cancel.subscribe()
    }

    /// Move along one lifecycle edge.
    ///
    /// An illegal edge leaves the execution untouched and is reported back.
    /// A repository failure is logged but does not undo the change.
    pub(crate) async fn transition<R, C>(
        &self,
        repository: &R,
        clock: &C,
        transition: Transition,
    ) -> Result<Execution, TransitionError>
    where
        R: JobRepository,
        C: Clock,
    {
        let at_ms = clock.epoch_ms();
        let to = transition.to;
        let mut outcome = None;
        self.state.send_if_modified(|execution| {
            match execution.apply(transition, at_ms) {
                Ok(()) => {
                    // Observers of a terminal state must find the output closed
                    if execution.is_terminal() {
                        self.output.close();
                    }
                    outcome = Some(Ok(execution.clone()));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });
        let outcome = outcome.unwrap_or_else(|| {
            Err(TransitionError {
                id: self.id(),
                from: self.state(),
                to,
            })
        });
        let execution = match outcome {
            Ok(execution) => execution,
            Err(e) => {
                tracing::warn!(error = %e, "rejected transition");
                return Err(e);
            }
        };

        tracing::info!(
            execution_id = %execution.id,
            project = %execution.project,
            state = %execution.state,
            exit = ?execution.exit_status,
            "execution state changed"
        );

        if let Some(repo_id) = &execution.repo_id {
            if let Err(e) = repository
                .record_state_change(repo_id, &StateChange::from(&execution))
                .await
            {
                tracing::error!(
                    execution_id = %execution.id,
                    %repo_id,
                    error = %e,
                    "failed to record state change"
                );
            }
        }

        Ok(execution)
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
