//! `sy run` specs

use crate::prelude::*;

#[test]
fn run_streams_output() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--", "echo", "hi"])
        .passes()
        .stdout_eq("hi\n");
}

#[test]
fn run_uses_shell_by_default() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--", "echo one && echo two"])
        .passes()
        .stdout_eq("one\ntwo\n");
}

#[test]
fn run_exit_code_mirrors_job() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--", "echo failing; exit 3"])
        .fails()
        .code_eq(3)
        .stdout_eq("failing\n");
}

#[test]
fn run_exports_job_environment() {
    let project = Project::empty();
    project
        .sy()
        .args(&[
            "run",
            "-p",
            "demo",
            "--commit",
            "abc123",
            "--",
            "echo $SY_PROJECT $SY_COMMIT",
        ])
        .passes()
        .stdout_eq("demo abc123\n");
}

#[test]
fn run_in_given_cwd() {
    let project = Project::empty();
    project.file("sub/marker.txt", "here\n");
    project
        .sy()
        .args(&["run", "-p", "demo", "--cwd", "sub", "--", "cat marker.txt"])
        .passes()
        .stdout_eq("here\n");
}

#[test]
fn run_writes_log_file() {
    let project = Project::empty();
    project
        .sy()
        .args(&["run", "-p", "demo", "--log", "job.log", "--", "echo logged"])
        .passes();

    assert_eq!(project.read("job.log"), "logged\n");
}

#[test]
fn run_json_reports_execution() {
    let project = Project::empty();
    let run = project
        .sy()
        .args(&["-o", "json", "run", "-p", "demo", "--", "echo hi"])
        .passes();

    let json = run.json();
    assert_eq!(json["project"], "demo");
    assert_eq!(json["state"], "succeeded");
    assert_eq!(json["exit_status"]["code"], 0);
    assert_eq!(json["requester"], "spec");
    assert_eq!(json["output"], "hi\n");
}
