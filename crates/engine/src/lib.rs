// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shipyard execution engine
//!
//! Admits execution requests, runs at most one execution per project at a
//! time in arrival order, supervises the spawned process, and fans its live
//! output out to any number of subscribers.

mod config;
mod dispatcher;
mod engine;
pub mod env;
mod error;
mod machine;
mod output;
mod worker;

#[cfg(test)]
mod test_helpers;

pub use config::EngineConfig;
pub use dispatcher::{Admission, QueueSnapshot};
pub use engine::{Engine, EngineDeps, SYSTEM_REQUESTER};
pub use error::EngineError;
pub use output::{OutputChannel, OutputChunk, Subscription};
