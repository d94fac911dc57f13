// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::{Engine, EngineConfig, EngineDeps};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use sy_adapters::{
    FakeProcessAdapter, JobRepository, MemoryJobRepository, ProcessAdapter, RepositoryError,
    StateChange,
};
use sy_core::{
    Clock, Execution, ExecutionId, ExecutionState, FakeClock, RepoId, SequentialIdGen,
};

/// Convenience alias for the fully-typed test engine.
pub(crate) type TestEngine = Engine<FakeProcessAdapter, MemoryJobRepository, FakeClock>;

/// Test context holding the engine and its fakes.
pub(crate) struct TestContext {
    pub engine: TestEngine,
    pub process: FakeProcessAdapter,
    pub repository: MemoryJobRepository,
    pub clock: FakeClock,
}

/// Short grace period so forced-kill tests finish quickly.
pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        kill_grace: Duration::from_millis(50),
        ..EngineConfig::default()
    }
}

pub(crate) fn setup() -> TestContext {
    setup_with(test_config())
}

pub(crate) fn setup_with(config: EngineConfig) -> TestContext {
    let process = FakeProcessAdapter::new();
    let repository = MemoryJobRepository::new();
    let clock = FakeClock::new();
    let engine = Engine::with_ids(
        EngineDeps {
            process: process.clone(),
            repository: repository.clone(),
        },
        clock.clone(),
        config,
        SequentialIdGen::new("exec"),
    );
    TestContext {
        engine,
        process,
        repository,
        clock,
    }
}

/// Block until `id` reaches `state`, failing the test after five seconds.
pub(crate) async fn wait_for_state<P, R, C>(
    engine: &Engine<P, R, C>,
    id: &ExecutionId,
    state: ExecutionState,
) -> Execution
where
    P: ProcessAdapter,
    R: JobRepository,
    C: Clock,
{
    let mut rx = engine.watch(id).unwrap();
    let reached = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|e| e.state == state))
        .await
        .unwrap_or_else(|_| panic!("{id} never reached {state}"))
        .unwrap();
    reached.clone()
}

/// Repository whose writes fail or stall on demand.
#[derive(Clone, Default)]
pub(crate) struct FlakyRepository {
    inner: MemoryJobRepository,
    fail_create: Arc<Mutex<bool>>,
    fail_changes: Arc<Mutex<bool>>,
    slow_changes: Arc<Mutex<Option<Duration>>>,
}

impl FlakyRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_create(&self, fail: bool) {
        *self.fail_create.lock() = fail;
    }

    pub(crate) fn fail_changes(&self, fail: bool) {
        *self.fail_changes.lock() = fail;
    }

    /// Delay every state-change write by `delay`, or stop delaying.
    pub(crate) fn slow_changes(&self, delay: Option<Duration>) {
        *self.slow_changes.lock() = delay;
    }

    pub(crate) fn inner(&self) -> &MemoryJobRepository {
        &self.inner
    }
}

#[async_trait]
impl JobRepository for FlakyRepository {
    async fn record_created(&self, execution: &Execution) -> Result<RepoId, RepositoryError> {
        if *self.fail_create.lock() {
            return Err(RepositoryError::Unavailable("store offline".to_string()));
        }
        self.inner.record_created(execution).await
    }

    async fn record_state_change(
        &self,
        id: &RepoId,
        change: &StateChange,
    ) -> Result<(), RepositoryError> {
        let delay = *self.slow_changes.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_changes.lock() {
            return Err(RepositoryError::Unavailable("store offline".to_string()));
        }
        self.inner.record_state_change(id, change).await
    }

    async fn find(&self, id: &RepoId) -> Result<Execution, RepositoryError> {
        self.inner.find(id).await
    }
}
