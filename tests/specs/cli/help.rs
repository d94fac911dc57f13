//! CLI help output specs

use crate::prelude::*;

#[test]
fn sy_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn sy_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("batch");
}

#[test]
fn sy_run_help_shows_usage() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("--project");
}
