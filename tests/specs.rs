//! Black-box tests for the sy CLI.
//!
//! Each test invokes the built binary and checks stdout, stderr, and the
//! exit code.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/help.rs"]
mod cli_help;
#[path = "specs/cli/run.rs"]
mod cli_run;
#[path = "specs/cli/errors.rs"]
mod cli_errors;

// batch/
#[path = "specs/batch/run.rs"]
mod batch_run;
