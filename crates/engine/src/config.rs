// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs

use crate::env;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a cancelled process gets between SIGTERM and SIGKILL
    pub kill_grace: Duration,
    /// Chunks buffered per live subscriber before it has to resync
    pub output_backlog: usize,
    /// Finished executions kept queryable before the oldest is forgotten
    pub retain_finished: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kill_grace: Duration::from_secs(5),
            output_backlog: 1024,
            retain_finished: 128,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SY_KILL_GRACE_MS`, `SY_OUTPUT_BACKLOG` and
    /// `SY_RETAIN_FINISHED` where set and parseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kill_grace: env::kill_grace_ms().unwrap_or(defaults.kill_grace),
            output_backlog: env::output_backlog().unwrap_or(defaults.output_backlog),
            retain_finished: env::retain_finished().unwrap_or(defaults.retain_finished),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
