// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use sy_core::Execution;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prefix every line of `text` with `[label] `, keeping line ends.
///
/// A trailing partial line gets a newline so prefixed output from different
/// jobs never runs together.
pub fn prefix_lines(label: &str, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + label.len() + 3);
    for line in text.split_inclusive('\n') {
        out.push('[');
        out.push_str(label);
        out.push_str("] ");
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Short human description of how an execution ended
pub fn outcome(execution: &Execution) -> String {
    match (&execution.exit_status, &execution.error) {
        (_, Some(error)) => format!("{} ({})", execution.state, error),
        (Some(status), None) => format!("{} ({})", execution.state, status),
        (None, None) => execution.state.to_string(),
    }
}

/// Format a millisecond duration compactly (e.g. "850ms", "4.2s", "3m07s")
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}
