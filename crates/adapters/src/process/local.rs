// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local OS process adapter

use super::{
    ControlSignal, ProcessAdapter, ProcessError, ProcessHandle, SpawnError, SpawnSpec,
    SupervisorEnds,
};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use sy_core::{CommandLine, ExitStatus};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Buffered output chunks between the pipe readers and the consumer.
const OUTPUT_CAPACITY: usize = 256;

/// Runs commands as child processes of this one.
///
/// Each child leads its own process group so termination requests reach
/// everything the command started, not just the shell.
#[derive(Clone, Debug)]
pub struct LocalProcessAdapter {
    shell: String,
}

impl LocalProcessAdapter {
    pub fn new() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }

    /// Use `shell` instead of `bash` for [`CommandLine::Shell`] scripts.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn build(&self, spec: &SpawnSpec) -> (Command, String) {
        let (mut cmd, program) = match &spec.command {
            CommandLine::Shell { script } => {
                let mut cmd = Command::new(&self.shell);
                cmd.arg("-c").arg(script);
                (cmd, self.shell.clone())
            }
            CommandLine::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                (cmd, program.clone())
            }
        };
        cmd.current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);
        (cmd, program)
    }
}

impl Default for LocalProcessAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessAdapter for LocalProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, SpawnError> {
        if !spec.cwd.is_dir() {
            return Err(SpawnError::InvalidWorkingDir(spec.cwd.clone()));
        }

        let (mut cmd, program) = self.build(spec);
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SpawnError::NotFound(program.clone()),
            io::ErrorKind::PermissionDenied => SpawnError::PermissionDenied(program.clone()),
            _ => SpawnError::Io(format!("{}: {}", program, e)),
        })?;

        let pid = child.id();
        let (handle, ends) = ProcessHandle::channel(pid, OUTPUT_CAPACITY);
        let SupervisorEnds {
            output,
            mut control,
            exit,
        } = ends;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, output.clone()));
        }
        drop(output);

        tokio::spawn(async move {
            let result = loop {
                tokio::select! {
                    status = child.wait() => {
                        break status
                            .map(convert_status)
                            .map_err(|e| ProcessError::Wait(e.to_string()));
                    }
                    Some(signal) = control.recv() => deliver(pid, signal),
                }
            };
            tracing::debug!(pid, result = ?result, "process exited");
            let _ = exit.send(result);
            // Descendants may outlive the leader and still hold the pipes;
            // the group stays signalable until every control handle drops.
            while let Some(signal) = control.recv().await {
                deliver(pid, signal);
            }
        });

        Ok(handle)
    }
}

/// Forward `reader` to `tx` line by line, lossily decoded.
async fn pump<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "output pipe read failed");
                break;
            }
        }
    }
}

fn deliver(pid: Option<u32>, signal: ControlSignal) {
    let Some(pid) = pid else {
        return;
    };
    let sig = match signal {
        ControlSignal::Terminate => Signal::SIGTERM,
        ControlSignal::Kill => Signal::SIGKILL,
    };
    // The child leads its own group, so its pid is the group id.
    if let Err(e) = killpg(Pid::from_raw(pid as i32), sig) {
        tracing::debug!(pid, signal = ?sig, error = %e, "signal not delivered");
    }
}

fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitStatus::Code(code),
        (None, Some(sig)) => ExitStatus::Signal(sig),
        (None, None) => ExitStatus::Code(-1),
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
