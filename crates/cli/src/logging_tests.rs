// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial(tracing)]
fn file_logging_creates_directory_and_flushes_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs/sy.log");

    let guard = init(Some(&path)).unwrap();
    assert!(guard.is_some());
    tracing::error!(execution_id = "exec-1", "repository write failed");
    drop(guard);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("repository write failed"), "got: {content}");
    assert!(content.contains("exec-1"));
}
