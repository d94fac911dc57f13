// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

// --- Process runner ---

/// Shell used for shell-form commands (default: bash)
pub fn shell() -> Option<String> {
    std::env::var("SY_SHELL").ok().filter(|s| !s.is_empty())
}

// --- Identity ---

/// Who is asking: SY_REQUESTER > USER > "cli"
pub fn requester() -> String {
    std::env::var("SY_REQUESTER")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("USER").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "cli".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
