// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triggerable command kinds and the request the engine accepts.

use crate::id::{ProjectKey, Requester};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What gets handed to the process runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandLine {
    /// Script run by `bash -c`; may span several lines
    Shell { script: String },
    /// Program executed directly with discrete arguments
    Exec { program: String, args: Vec<String> },
}

impl CommandLine {
    pub fn shell(script: impl Into<String>) -> Self {
        CommandLine::Shell {
            script: script.into(),
        }
    }

    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLine::Shell { script } => f.write_str(script),
            CommandLine::Exec { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A kind of job that knows how to turn itself into a command.
pub trait Runnable {
    fn command(&self) -> CommandLine;

    fn working_dir(&self) -> &Path;

    /// Commit or ref this run targets, if the kind has one
    fn commit(&self) -> Option<&str> {
        None
    }
}

/// Ad-hoc job: stored commands in their given order, then free-form script.
#[derive(Debug, Clone, Default)]
pub struct JobCommand {
    pub stored: Vec<String>,
    pub script: String,
    pub cwd: PathBuf,
    pub commit: Option<String>,
}

impl JobCommand {
    pub fn new(cwd: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            script: script.into(),
            ..Self::default()
        }
    }

    pub fn with_stored<I, S>(mut self, stored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stored = stored.into_iter().map(Into::into).collect();
        self
    }

    pub fn at_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }
}

impl Runnable for JobCommand {
    fn command(&self) -> CommandLine {
        let lines: Vec<&str> = self
            .stored
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.script.as_str()))
            .filter(|line| !line.trim().is_empty())
            .collect();
        CommandLine::shell(lines.join("\n"))
    }

    fn working_dir(&self) -> &Path {
        &self.cwd
    }

    fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }
}

/// Deploy of a stage: the stage's command list run against a reference.
#[derive(Debug, Clone)]
pub struct DeployCommand {
    pub stage: String,
    pub commands: Vec<String>,
    pub reference: String,
    pub cwd: PathBuf,
}

impl Runnable for DeployCommand {
    fn command(&self) -> CommandLine {
        CommandLine::shell(self.commands.join("\n"))
    }

    fn working_dir(&self) -> &Path {
        &self.cwd
    }

    fn commit(&self) -> Option<&str> {
        Some(&self.reference)
    }
}

/// Everything the engine needs to admit one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub project: ProjectKey,
    pub command: CommandLine,
    pub cwd: PathBuf,
    pub commit: Option<String>,
    pub requester: Requester,
    /// Extra environment for the spawned process
    pub env: Vec<(String, String)>,
}

impl ExecutionRequest {
    pub fn new(
        project: impl Into<ProjectKey>,
        command: CommandLine,
        cwd: impl Into<PathBuf>,
        requester: impl Into<Requester>,
    ) -> Self {
        Self {
            project: project.into(),
            command,
            cwd: cwd.into(),
            commit: None,
            requester: requester.into(),
            env: Vec::new(),
        }
    }

    pub fn from_runnable(
        project: impl Into<ProjectKey>,
        runnable: &dyn Runnable,
        requester: impl Into<Requester>,
    ) -> Self {
        let mut request = Self::new(
            project,
            runnable.command(),
            runnable.working_dir(),
            requester,
        );
        request.commit = runnable.commit().map(str::to_string);
        request
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
#[path = "runnable_tests.rs"]
mod tests;
