// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    ControlSignal, ProcessAdapter, ProcessHandle, SpawnError, SpawnSpec, SupervisorEnds,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use sy_core::ExitStatus;
use tokio::sync::Notify;

/// Scripted behavior for one command.
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub output: Vec<String>,
    pub exit: ExitStatus,
    /// Stay alive after emitting output until released or signalled
    pub hold: bool,
    /// Keep running through `terminate()`; only `kill()` stops it
    pub ignore_terminate: bool,
}

impl FakeScript {
    pub fn exits(code: i32) -> Self {
        Self {
            output: Vec::new(),
            exit: ExitStatus::Code(code),
            hold: false,
            ignore_terminate: false,
        }
    }

    pub fn output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn ignoring_terminate(mut self) -> Self {
        self.hold = true;
        self.ignore_terminate = true;
        self
    }
}

impl Default for FakeScript {
    fn default() -> Self {
        Self::exits(0)
    }
}

/// Recorded spawn
#[derive(Debug, Clone)]
pub struct SpawnCall {
    pub spec: SpawnSpec,
}

#[derive(Default)]
struct FakeProcessState {
    scripts: HashMap<String, FakeScript>,
    spawn_errors: HashMap<String, SpawnError>,
    gates: HashMap<String, Arc<Notify>>,
    calls: Vec<SpawnCall>,
    signals: HashMap<String, Vec<ControlSignal>>,
}

/// Fake process adapter for testing.
///
/// Commands are matched by their display text. Unscripted commands exit 0
/// immediately with no output.
#[derive(Clone, Default)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of `command`
    pub fn script(&self, command: &str, script: FakeScript) {
        self.inner.lock().scripts.insert(command.to_string(), script);
    }

    /// Make spawning `command` fail with `error`
    pub fn fail_spawn(&self, command: &str, error: SpawnError) {
        self.inner
            .lock()
            .spawn_errors
            .insert(command.to_string(), error);
    }

    /// Let a held `command` exit with its scripted status
    pub fn release(&self, command: &str) {
        self.gate(command).notify_one();
    }

    /// All successful and failed spawn attempts, in order
    pub fn calls(&self) -> Vec<SpawnCall> {
        self.inner.lock().calls.clone()
    }

    /// Display text of every command spawned, in order
    pub fn spawned(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .map(|c| c.spec.command.to_string())
            .collect()
    }

    /// Control signals `command` has received
    pub fn signals(&self, command: &str) -> Vec<ControlSignal> {
        self.inner
            .lock()
            .signals
            .get(command)
            .cloned()
            .unwrap_or_default()
    }

    fn gate(&self, command: &str) -> Arc<Notify> {
        Arc::clone(
            self.inner
                .lock()
                .gates
                .entry(command.to_string())
                .or_default(),
        )
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, SpawnError> {
        let key = spec.command.to_string();
        let script = {
            let mut state = self.inner.lock();
            state.calls.push(SpawnCall { spec: spec.clone() });
            if let Some(err) = state.spawn_errors.get(&key) {
                return Err(err.clone());
            }
            state.scripts.get(&key).cloned().unwrap_or_default()
        };
        let gate = self.gate(&key);
        let inner = Arc::clone(&self.inner);

        let (handle, ends) = ProcessHandle::channel(Some(4242), script.output.len() + 1);
        let SupervisorEnds {
            output,
            mut control,
            exit,
        } = ends;

        tokio::spawn(async move {
            for line in script.output {
                if output.send(line).await.is_err() {
                    break;
                }
            }
            drop(output);

            let status = if !script.hold {
                script.exit
            } else {
                loop {
                    tokio::select! {
                        _ = gate.notified() => break script.exit,
                        signal = control.recv() => {
                            let Some(signal) = signal else {
                                gate.notified().await;
                                break script.exit;
                            };
                            inner.lock().signals.entry(key.clone()).or_default().push(signal);
                            match signal {
                                ControlSignal::Terminate if script.ignore_terminate => continue,
                                ControlSignal::Terminate => break ExitStatus::Signal(15),
                                ControlSignal::Kill => break ExitStatus::Signal(9),
                            }
                        }
                    }
                }
            };
            let _ = exit.send(Ok(status));
        });

        Ok(handle)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
