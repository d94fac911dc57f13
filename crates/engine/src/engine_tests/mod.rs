// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tests

mod admission;
mod cancel;
mod lifecycle;
mod local;
mod output;

use super::*;
use crate::test_helpers::{setup, setup_with, test_config, wait_for_state, TestContext};
use std::time::Duration;
use sy_adapters::{FakeScript, SpawnError};
use sy_core::test_support::shell_request;
use sy_core::ExitStatus;

fn project(key: &str) -> ProjectKey {
    ProjectKey::new(key)
}

/// Start `script` on `project`, keeping it running until released.
async fn start_held(ctx: &TestContext, project: &str, script: &str) -> Execution {
    ctx.process.script(script, FakeScript::exits(0).held());
    ctx.engine
        .start_execution(shell_request(project, script))
        .await
        .unwrap()
}

/// Poll until `check` holds, failing the test after five seconds.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}
