//! CLI error specs

use crate::prelude::*;

#[test]
fn run_without_project_is_usage_error() {
    cli()
        .args(&["run", "--", "true"])
        .fails()
        .code_eq(2)
        .stderr_has("--project");
}

#[test]
fn exec_of_missing_program_errors() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--exec", "--", "sy-no-such-program"])
        .fails()
        .code_eq(1)
        .stderr_has("job errored");
}

#[test]
fn missing_working_directory_errors() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--cwd", "missing", "--", "true"])
        .fails()
        .code_eq(1)
        .stderr_has("job errored");
}

#[test]
fn missing_batch_file_is_reported() {
    let project = Project::empty();
    project
        .sy()
        .args(&["batch", "nope.toml"])
        .fails()
        .stderr_has("cannot read batch file");
}
