// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sy run -p <project> -- <command...>` - Run one job and stream its output

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sy_core::{CommandLine, Execution, ExecutionRequest, Requester};
use sy_engine::EngineError;

use super::{build_engine, finish};
use crate::env;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Project the job belongs to; jobs of one project run one at a time
    #[arg(short = 'p', long = "project")]
    pub project: String,

    /// Working directory (default: current directory)
    #[arg(long = "cwd")]
    pub cwd: Option<PathBuf>,

    /// Commit or ref the job is for (exported as SY_COMMIT)
    #[arg(long = "commit")]
    pub commit: Option<String>,

    /// Run the command directly instead of through the shell
    #[arg(long = "exec")]
    pub exec: bool,

    /// Also write the job's full output to this file
    #[arg(long = "log")]
    pub log: Option<PathBuf>,

    /// Command to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Final JSON report of `sy run -o json`
#[derive(Serialize)]
struct RunReport<'a> {
    #[serde(flatten)]
    execution: &'a Execution,
    output: String,
}

/// Build the command line from the trailing arguments.
///
/// Shell form joins the words with spaces and hands them to the shell, so
/// quoting and operators work as typed. Exec form runs the first word as
/// the program with the rest as its arguments.
pub(crate) fn command_line(words: &[String], exec: bool) -> Result<CommandLine> {
    let (program, args) = words.split_first().context("no command given")?;
    Ok(if exec {
        CommandLine::exec(program.clone(), args.iter().cloned())
    } else {
        CommandLine::shell(words.join(" "))
    })
}

pub(crate) fn build_request(args: &RunArgs) -> Result<ExecutionRequest> {
    let cwd = match &args.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let mut request = ExecutionRequest::new(
        args.project.as_str(),
        command_line(&args.command, args.exec)?,
        cwd,
        env::requester(),
    );
    if let Some(commit) = &args.commit {
        request = request.with_commit(commit.clone());
    }
    Ok(request)
}

pub async fn handle(args: RunArgs, format: OutputFormat) -> Result<()> {
    let request = build_request(&args)?;
    let engine = build_engine();

    let started = engine.start_execution(request).await?;
    let id = started.id.clone();
    tracing::debug!(execution_id = %id, state = %started.state, "job admitted");

    let mut output = engine.subscribe(&id)?;
    // Pin ctrl_c outside the loop so a signal is not lost between iterations
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            chunk = output.next() => match chunk {
                Some(chunk) => {
                    if format == OutputFormat::Text {
                        let mut stdout = std::io::stdout().lock();
                        stdout.write_all(chunk.text.as_bytes())?;
                        stdout.flush()?;
                    }
                }
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                eprintln!("Cancelling {}...", id.short(8));
                match engine.cancel_execution(&id, Requester::new(env::requester())).await {
                    Ok(()) | Err(EngineError::AlreadyTerminal { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    let done = engine.wait(&id).await?;
    let transcript = engine.transcript(&id)?;
    if let Some(path) = &args.log {
        std::fs::write(path, &transcript)
            .with_context(|| format!("cannot write job log {}", path.display()))?;
    }

    if format == OutputFormat::Json {
        print_json(&RunReport {
            execution: &done,
            output: transcript,
        })?;
    }

    finish(&done)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
