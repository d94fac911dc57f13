// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine facade

use crate::config::EngineConfig;
use crate::dispatcher::{Admission, Dispatcher, QueueSnapshot};
use crate::error::EngineError;
use crate::machine::ExecutionMachine;
use crate::output::Subscription;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sy_adapters::{JobRepository, ProcessAdapter};
use sy_core::{
    Clock, Execution, ExecutionId, ExecutionRequest, ExecutionState, IdGen, ProjectKey, Requester,
    Transition, UuidIdGen,
};
use tokio::sync::{oneshot, watch};

/// Requester recorded when the engine itself cancels, e.g. on shutdown
pub const SYSTEM_REQUESTER: &str = "system";

/// Engine adapter dependencies
pub struct EngineDeps<P, R> {
    pub process: P,
    pub repository: R,
}

pub(crate) struct EngineInner<P, R, C> {
    pub(crate) process: P,
    pub(crate) repository: R,
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
    pub(crate) dispatcher: Dispatcher,
    enabled: AtomicBool,
    executions: Mutex<HashMap<ExecutionId, Arc<ExecutionMachine>>>,
    /// Terminal executions still held in memory, oldest first
    finished: Mutex<VecDeque<ExecutionId>>,
    next_id: Box<dyn Fn() -> String + Send + Sync>,
}

/// Job execution engine.
///
/// Cheap to clone; clones share the same executions and queues.
pub struct Engine<P, R, C> {
    pub(crate) inner: Arc<EngineInner<P, R, C>>,
}

impl<P, R, C> Clone for Engine<P, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R, C> Engine<P, R, C>
where
    P: ProcessAdapter,
    R: JobRepository,
    C: Clock,
{
    /// Create an engine that assigns random execution ids
    pub fn new(deps: EngineDeps<P, R>, clock: C, config: EngineConfig) -> Self {
        Self::with_ids(deps, clock, config, UuidIdGen)
    }

    /// Create an engine drawing execution ids from `ids`
    pub fn with_ids(
        deps: EngineDeps<P, R>,
        clock: C,
        config: EngineConfig,
        ids: impl IdGen,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                process: deps.process,
                repository: deps.repository,
                clock,
                config,
                dispatcher: Dispatcher::new(),
                enabled: AtomicBool::new(true),
                executions: Mutex::new(HashMap::new()),
                finished: Mutex::new(VecDeque::new()),
                next_id: Box::new(move || ids.next()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Gate admission of new executions. Admitted ones are unaffected.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.inner.enabled.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            tracing::info!(enabled, "engine admission toggled");
        }
    }

    /// Admit a new execution for `request.project`.
    ///
    /// If the project is idle a worker is handed the execution and this
    /// returns once the spawn attempt is over (it comes back `running`, or
    /// `errored` if the spawn failed); otherwise it comes back `pending`
    /// behind the executions already admitted. Dropping the returned future
    /// never affects an admitted execution.
    pub async fn start_execution(&self, request: ExecutionRequest) -> Result<Execution, EngineError> {
        if !self.is_enabled() {
            return Err(EngineError::Disabled);
        }

        let mut execution = Execution {
            id: ExecutionId::new((self.inner.next_id)()),
            project: request.project,
            command: request.command,
            cwd: request.cwd,
            commit: request.commit,
            requester: request.requester,
            state: ExecutionState::Pending,
            created_at_ms: self.inner.clock.epoch_ms(),
            started_at_ms: None,
            finished_at_ms: None,
            exit_status: None,
            repo_id: None,
            cancelled_by: None,
            error: None,
        };
        execution.repo_id = Some(self.inner.repository.record_created(&execution).await?);

        let id = execution.id.clone();
        let project = execution.project.clone();
        let machine = Arc::new(
            ExecutionMachine::new(execution, self.inner.config.output_backlog)
                .with_env(request.env),
        );
        self.inner
            .executions
            .lock()
            .insert(id.clone(), Arc::clone(&machine));

        match self.inner.dispatcher.admit(&project, id.clone()) {
            Admission::Start => {
                tracing::info!(execution_id = %id, %project, "starting");
                // The worker owns the slot from here on, so dropping this
                // future cannot strand the project.
                let (started_tx, started_rx) = oneshot::channel();
                let engine = self.clone();
                let worker = Arc::clone(&machine);
                tokio::spawn(async move {
                    let handle = engine.start(&worker).await;
                    let _ = started_tx.send(());
                    engine.drive(worker, handle).await;
                });
                let _ = started_rx.await;
                Ok(machine.snapshot())
            }
            Admission::Queued { position } => {
                tracing::info!(execution_id = %id, %project, position, "queued");
                Ok(machine.snapshot())
            }
        }
    }

    /// Cancel a pending or running execution.
    ///
    /// A pending execution is dequeued and cancelled before this returns. A
    /// running one is signalled and reaches `cancelled` once its process has
    /// exited; use [`Engine::wait`] to observe that.
    pub async fn cancel_execution(
        &self,
        id: &ExecutionId,
        requester: Requester,
    ) -> Result<(), EngineError> {
        let machine = self
            .lookup(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let state = machine.state();
        if state.is_terminal() {
            return Err(EngineError::AlreadyTerminal {
                id: id.clone(),
                state,
            });
        }

        if self.inner.dispatcher.remove_pending(&machine.project(), id) {
            tracing::info!(execution_id = %id, %requester, "cancelling pending execution");
            machine
                .transition(
                    &self.inner.repository,
                    &self.inner.clock,
                    Transition::to(ExecutionState::Cancelled).cancelled_by(Some(requester)),
                )
                .await?;
            self.retire(id);
            return Ok(());
        }

        match machine.request_cancel(requester.clone()) {
            Ok(true) => tracing::info!(execution_id = %id, %requester, "cancel requested"),
            Ok(false) => tracing::debug!(execution_id = %id, "cancel already requested"),
            // The worker finished after the check above
            Err(state) => {
                return Err(EngineError::AlreadyTerminal {
                    id: id.clone(),
                    state,
                })
            }
        }
        Ok(())
    }

    /// Output of `id`: everything so far, then live chunks until it ends.
    pub fn subscribe(&self, id: &ExecutionId) -> Result<Subscription, EngineError> {
        self.machine(id).map(|m| m.output().subscribe())
    }

    /// Full output retained for `id`
    pub fn transcript(&self, id: &ExecutionId) -> Result<String, EngineError> {
        self.machine(id).map(|m| m.output().transcript())
    }

    /// Current snapshot of `id`
    pub fn execution(&self, id: &ExecutionId) -> Option<Execution> {
        self.lookup(id).map(|m| m.snapshot())
    }

    /// Receiver notified on every state change of `id`
    pub fn watch(&self, id: &ExecutionId) -> Result<watch::Receiver<Execution>, EngineError> {
        self.machine(id).map(|m| m.watch())
    }

    /// Wait for `id` to reach a terminal state.
    pub async fn wait(&self, id: &ExecutionId) -> Result<Execution, EngineError> {
        let machine = self.machine(id)?;
        Ok(machine.finished().await)
    }

    pub fn queue(&self, project: &ProjectKey) -> QueueSnapshot {
        self.inner.dispatcher.snapshot(project)
    }

    /// Every pending or running execution, oldest first
    pub fn active(&self) -> Vec<Execution> {
        let mut active: Vec<Execution> = self
            .inner
            .executions
            .lock()
            .values()
            .map(|m| m.snapshot())
            .filter(|e| !e.is_terminal())
            .collect();
        active.sort_by(|a, b| {
            (a.created_at_ms, a.id.as_str()).cmp(&(b.created_at_ms, b.id.as_str()))
        });
        active
    }

    /// Stop admitting, cancel everything in flight, and wait for it to end.
    pub async fn shutdown(&self) {
        self.set_enabled(false);
        let mut active = self.active();
        // Dequeue pending work first so nothing is promoted mid-shutdown
        active.sort_by_key(|e| e.state != ExecutionState::Pending);
        tracing::info!(count = active.len(), "shutting down");

        let mut waiting = Vec::new();
        for execution in active {
            let Some(machine) = self.lookup(&execution.id) else {
                continue;
            };
            match self
                .cancel_execution(&execution.id, Requester::new(SYSTEM_REQUESTER))
                .await
            {
                Ok(()) | Err(EngineError::AlreadyTerminal { .. }) => {}
                Err(e) => {
                    tracing::warn!(execution_id = %execution.id, error = %e, "cancel on shutdown failed");
                }
            }
            waiting.push(machine);
        }
        for machine in waiting {
            machine.finished().await;
        }
    }

    pub(crate) fn lookup(&self, id: &ExecutionId) -> Option<Arc<ExecutionMachine>> {
        self.inner.executions.lock().get(id).cloned()
    }

    fn machine(&self, id: &ExecutionId) -> Result<Arc<ExecutionMachine>, EngineError> {
        self.lookup(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// Apply a terminal transition and retire the execution.
    pub(crate) async fn finish(&self, machine: &ExecutionMachine, transition: Transition) {
        if machine
            .transition(&self.inner.repository, &self.inner.clock, transition)
            .await
            .is_ok()
        {
            self.retire(&machine.id());
        }
    }

    /// Remember `id` as finished and forget the oldest finished executions
    /// beyond the retention limit.
    fn retire(&self, id: &ExecutionId) {
        let evicted: Vec<ExecutionId> = {
            let mut finished = self.inner.finished.lock();
            finished.push_back(id.clone());
            let excess = finished
                .len()
                .saturating_sub(self.inner.config.retain_finished);
            finished.drain(..excess).collect()
        };
        if evicted.is_empty() {
            return;
        }
        let mut executions = self.inner.executions.lock();
        for id in evicted {
            executions.remove(&id);
            tracing::debug!(execution_id = %id, "evicted finished execution");
        }
    }
}

#[cfg(test)]
#[path = "engine_tests/mod.rs"]
mod tests;
