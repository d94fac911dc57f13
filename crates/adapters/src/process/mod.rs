// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process runner adapters
//!
//! A [`ProcessAdapter`] launches one OS process per call and hands back a
//! [`ProcessHandle`]: the live output as newline-terminated chunks, the exit
//! status, and a cloneable [`ProcessControl`] for termination requests that
//! can be used from outside the task supervising the process.

mod local;

pub use local::LocalProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, FakeScript, SpawnCall};

use async_trait::async_trait;
use std::path::PathBuf;
use sy_core::{CommandLine, ExitStatus};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors from launching a process
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("executable not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid working directory: {0}")]
    InvalidWorkingDir(PathBuf),
    #[error("spawn failed: {0}")]
    Io(String),
}

/// Errors from supervising a launched process
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("wait failed: {0}")]
    Wait(String),
    #[error("process supervisor went away")]
    Lost,
}

/// What to launch and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    pub command: CommandLine,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl SpawnSpec {
    pub fn new(command: CommandLine, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }
}

/// Termination request delivered to a running process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Ask politely (SIGTERM to the process group)
    Terminate,
    /// Force (SIGKILL to the process group)
    Kill,
}

/// Cloneable termination handle.
///
/// Both requests are fire-and-forget and reach the whole process group,
/// including descendants that outlive the process itself. Once nothing in
/// the group is left they are silent no-ops.
#[derive(Debug, Clone)]
pub struct ProcessControl {
    tx: mpsc::UnboundedSender<ControlSignal>,
}

impl ProcessControl {
    pub fn terminate(&self) {
        let _ = self.tx.send(ControlSignal::Terminate);
    }

    pub fn kill(&self) {
        let _ = self.tx.send(ControlSignal::Kill);
    }
}

/// Live output of a launched process
pub struct OutputStream {
    rx: mpsc::Receiver<String>,
}

impl OutputStream {
    /// Next output chunk, or `None` once every output pipe has closed.
    ///
    /// Cancel-safe: may be used as a `tokio::select!` branch.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Exit notification of a launched process
pub struct ExitWaiter {
    rx: oneshot::Receiver<Result<ExitStatus, ProcessError>>,
    exited: Option<Result<ExitStatus, ProcessError>>,
}

impl ExitWaiter {
    /// Wait for exit. Repeated calls return the same result.
    ///
    /// Cancel-safe: may be used as a `tokio::select!` branch.
    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        if let Some(done) = &self.exited {
            return done.clone();
        }
        let result = (&mut self.rx).await.unwrap_or(Err(ProcessError::Lost));
        self.exited = Some(result.clone());
        result
    }
}

/// A launched process.
pub struct ProcessHandle {
    pid: Option<u32>,
    output: OutputStream,
    exit: ExitWaiter,
    control: ProcessControl,
}

impl ProcessHandle {
    /// Assemble a handle from the channels a supervisor task feeds.
    ///
    /// Returns the handle together with the supervisor's ends: the output
    /// sender, the receiver of control requests, and the exit reporter.
    pub fn channel(pid: Option<u32>, output_capacity: usize) -> (Self, SupervisorEnds) {
        let (output_tx, output_rx) = mpsc::channel(output_capacity.max(1));
        let (exit_tx, exit_rx) = oneshot::channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let handle = Self {
            pid,
            output: OutputStream { rx: output_rx },
            exit: ExitWaiter {
                rx: exit_rx,
                exited: None,
            },
            control: ProcessControl { tx: control_tx },
        };
        let ends = SupervisorEnds {
            output: output_tx,
            control: control_rx,
            exit: exit_tx,
        };
        (handle, ends)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub async fn next_chunk(&mut self) -> Option<String> {
        self.output.next_chunk().await
    }

    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        self.exit.wait().await
    }

    pub fn control(&self) -> ProcessControl {
        self.control.clone()
    }

    pub fn terminate(&self) {
        self.control.terminate();
    }

    pub fn kill(&self) {
        self.control.kill();
    }

    /// Split into independently borrowable parts, for supervisors that
    /// select over output, exit and termination at once.
    pub fn into_parts(self) -> (OutputStream, ExitWaiter, ProcessControl) {
        (self.output, self.exit, self.control)
    }
}

/// The supervisor-side ends of a [`ProcessHandle`]
pub struct SupervisorEnds {
    pub output: mpsc::Sender<String>,
    pub control: mpsc::UnboundedReceiver<ControlSignal>,
    pub exit: oneshot::Sender<Result<ExitStatus, ProcessError>>,
}

/// Adapter for launching processes
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Launch `spec`. Fails without side effects when nothing was started.
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, SpawnError>;
}
