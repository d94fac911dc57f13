// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sy batch <file.toml>` - Run a set of jobs across projects
//!
//! ```toml
//! [[job]]
//! project = "web"
//! commands = ["npm ci"]      # stored commands, run first in order
//! run = "npm test"
//! cwd = "web"                # relative to the batch file
//!
//! [[job]]
//! project = "api"
//! run = "cargo test"
//! ```
//!
//! Jobs are admitted in file order; jobs of the same project run one after
//! another, different projects run side by side.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use sy_core::{
    Execution, ExecutionId, ExecutionRequest, ExecutionState, ExitStatus, JobCommand, ProjectKey,
};

use super::{build_engine, CliEngine};
use crate::env;
use crate::exit_error::ExitError;
use crate::output::{format_duration_ms, outcome, prefix_lines, print_json, OutputFormat};

#[derive(Args)]
pub struct BatchArgs {
    /// TOML file with one `[[job]]` table per job
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchFile {
    #[serde(default, rename = "job")]
    pub jobs: Vec<BatchJob>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchJob {
    pub project: String,
    /// Free-form script run after the stored commands
    #[serde(default)]
    pub run: Option<String>,
    /// Stored commands, run first in the given order
    #[serde(default)]
    pub commands: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub commit: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// One row of the batch summary
#[derive(Debug, Serialize)]
pub(crate) struct SummaryRow {
    pub id: ExecutionId,
    pub project: ProjectKey,
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<ExitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Execution> for SummaryRow {
    fn from(execution: &Execution) -> Self {
        Self {
            id: execution.id.clone(),
            project: execution.project.clone(),
            state: execution.state,
            exit_status: execution.exit_status,
            duration_ms: execution.duration_ms(),
            error: execution.error.clone(),
        }
    }
}

pub(crate) fn parse_batch(content: &str) -> Result<BatchFile> {
    let file: BatchFile = toml::from_str(content)?;
    if file.jobs.is_empty() {
        bail!("batch file defines no [[job]] entries");
    }
    for (i, job) in file.jobs.iter().enumerate() {
        if job.project.trim().is_empty() {
            bail!("job {} has an empty project", i + 1);
        }
        let has_script = job.run.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_script && job.commands.iter().all(|c| c.trim().is_empty()) {
            bail!("job {} ({}) has nothing to run", i + 1, job.project);
        }
    }
    Ok(file)
}

/// Request for `job`, with a relative `cwd` resolved against `base`.
pub(crate) fn job_request(job: &BatchJob, base: &Path, requester: &str) -> ExecutionRequest {
    let cwd = match &job.cwd {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => base.join(dir),
        None => base.to_path_buf(),
    };
    let mut command =
        JobCommand::new(cwd, job.run.clone().unwrap_or_default()).with_stored(job.commands.clone());
    if let Some(commit) = &job.commit {
        command = command.at_commit(commit.clone());
    }
    let mut request = ExecutionRequest::from_runnable(job.project.as_str(), &command, requester);
    for (key, value) in &job.env {
        request = request.with_env(key.clone(), value.clone());
    }
    request
}

pub async fn handle(args: BatchArgs, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read batch file {}", args.file.display()))?;
    let batch = parse_batch(&content)
        .with_context(|| format!("invalid batch file {}", args.file.display()))?;
    let base = match args.file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };

    let engine = build_engine();
    let requester = env::requester();
    let mut ids = Vec::new();
    let mut printers = Vec::new();
    for job in &batch.jobs {
        let started = engine
            .start_execution(job_request(job, &base, &requester))
            .await?;
        let mut subscription = engine.subscribe(&started.id)?;
        let label = started.project.to_string();
        printers.push(tokio::spawn(async move {
            while let Some(chunk) = subscription.next().await {
                if format == OutputFormat::Text {
                    // Lines from one chunk stay together
                    let _ = std::io::stdout()
                        .lock()
                        .write_all(prefix_lines(&label, &chunk.text).as_bytes());
                }
            }
        }));
        ids.push(started.id);
    }

    let finished = tokio::select! {
        finished = wait_all(&engine, &ids) => finished?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Cancelling batch...");
            engine.shutdown().await;
            wait_all(&engine, &ids).await?
        }
    };
    for printer in printers {
        let _ = printer.await;
    }

    let rows: Vec<SummaryRow> = finished.iter().map(SummaryRow::from).collect();
    match format {
        OutputFormat::Text => print_summary(&finished),
        OutputFormat::Json => print_json(&rows)?,
    }

    let failed = finished
        .iter()
        .filter(|e| e.state != ExecutionState::Succeeded)
        .count();
    if failed > 0 {
        let message = format!("{} of {} jobs did not succeed", failed, finished.len());
        return Err(ExitError::new(1, message).into());
    }
    Ok(())
}

async fn wait_all(engine: &CliEngine, ids: &[ExecutionId]) -> Result<Vec<Execution>> {
    let mut finished = Vec::with_capacity(ids.len());
    for id in ids {
        finished.push(engine.wait(id).await?);
    }
    Ok(finished)
}

fn print_summary(finished: &[Execution]) {
    let width = finished
        .iter()
        .map(|e| e.project.as_str().len())
        .max()
        .unwrap_or(0);
    println!();
    for execution in finished {
        let duration = execution
            .duration_ms()
            .map(format_duration_ms)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<width$}  {:<8}  {}",
            execution.id.short(8),
            execution.project,
            duration,
            outcome(execution),
        );
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
