// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

// --- Parse helpers (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_count(var: &str) -> Option<usize> {
    std::env::var(var).ok().and_then(|s| s.parse::<usize>().ok())
}

// --- Supervision ---

/// Grace period between SIGTERM and SIGKILL when cancelling
pub fn kill_grace_ms() -> Option<Duration> {
    parse_duration_ms("SY_KILL_GRACE_MS")
}

// --- Output ---

/// Live-delivery buffer per subscriber, in chunks
pub fn output_backlog() -> Option<usize> {
    parse_count("SY_OUTPUT_BACKLOG").filter(|n| *n > 0)
}

// --- Retention ---

/// Number of finished executions kept queryable
pub fn retain_finished() -> Option<usize> {
    parse_count("SY_RETAIN_FINISHED")
}
