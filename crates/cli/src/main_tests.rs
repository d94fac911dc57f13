// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::error::ErrorKind;
use clap::Parser;

use super::{cli_command, format_error, Cli, Commands};
use crate::output::OutputFormat;

// -- Version flag -----------------------------------------------------------

#[yare::parameterized(
    short = { "-V" },
    long  = { "--version" },
)]
fn version_flag(flag: &str) {
    let err = cli_command()
        .try_get_matches_from(["sy", flag])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn no_subcommand_parses() {
    let cli = Cli::try_parse_from(["sy"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.output, OutputFormat::Text);
}

// -- Run --------------------------------------------------------------------

#[test]
fn run_requires_project() {
    let err = Cli::try_parse_from(["sy", "run", "--", "true"])
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn run_requires_command() {
    let err = Cli::try_parse_from(["sy", "run", "-p", "web"]).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn run_passes_hyphenated_args_through() {
    let cli = Cli::try_parse_from(["sy", "run", "-p", "web", "--", "ls", "-la", "--color"]).unwrap();
    let Some(Commands::Run(args)) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.project, "web");
    assert_eq!(args.command, vec!["ls", "-la", "--color"]);
    assert!(!args.exec);
}

#[test]
fn output_flag_is_global() {
    let cli = Cli::try_parse_from(["sy", "run", "-o", "json", "-p", "web", "true"]).unwrap();
    assert_eq!(cli.output, OutputFormat::Json);
}

// -- Batch ------------------------------------------------------------------

#[test]
fn batch_takes_a_file() {
    let cli = Cli::try_parse_from(["sy", "--log-file", "/tmp/sy.log", "batch", "jobs.toml"]).unwrap();
    let Some(Commands::Batch(args)) = cli.command else {
        panic!("expected batch");
    };
    assert_eq!(args.file, std::path::PathBuf::from("jobs.toml"));
    assert_eq!(cli.log_file.as_deref(), Some(std::path::Path::new("/tmp/sy.log")));
}

// -- Error formatting -------------------------------------------------------

#[test]
fn format_error_skips_redundant_chain() {
    let err = anyhow::anyhow!("disk full").context("write failed: disk full");
    assert_eq!(format_error(&err), "write failed: disk full");
}

#[test]
fn format_error_renders_distinct_causes() {
    let err = anyhow::anyhow!("disk full").context("cannot write job log");
    assert_eq!(
        format_error(&err),
        "cannot write job log\n\nCaused by:\n    0: disk full"
    );
}
