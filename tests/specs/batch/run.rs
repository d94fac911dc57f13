//! `sy batch` specs

use crate::prelude::*;

const SAME_PROJECT: &str = r#"
[[job]]
project = "web"
run = "echo first"

[[job]]
project = "web"
commands = ["echo stored"]
run = "echo second"
"#;

#[test]
fn batch_runs_jobs_of_one_project_in_order() {
    let project = Project::empty();
    project.file("jobs.toml", SAME_PROJECT);

    let run = project.sy().args(&["batch", "jobs.toml"]).passes();

    let stdout = run.stdout();
    let lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(lines, vec!["[web] first", "[web] stored", "[web] second"]);
}

#[test]
fn batch_runs_in_job_cwd() {
    let project = Project::empty();
    project.file("api/name.txt", "api-dir\n");
    project.file(
        "jobs.toml",
        "[[job]]\nproject = \"api\"\ncwd = \"api\"\nrun = \"cat name.txt\"\n",
    );

    project
        .sy()
        .args(&["batch", "jobs.toml"])
        .passes()
        .stdout_has("[api] api-dir\n");
}

#[test]
fn batch_fails_when_any_job_fails() {
    let project = Project::empty();
    project.file(
        "jobs.toml",
        "[[job]]\nproject = \"a\"\nrun = \"true\"\n\n[[job]]\nproject = \"b\"\nrun = \"exit 4\"\n",
    );

    project
        .sy()
        .args(&["batch", "jobs.toml"])
        .fails()
        .code_eq(1)
        .stderr_has("1 of 2 jobs did not succeed");
}

#[test]
fn batch_json_summarizes_each_job() {
    let project = Project::empty();
    project.file(
        "jobs.toml",
        "[[job]]\nproject = \"a\"\nrun = \"true\"\n\n[[job]]\nproject = \"b\"\nrun = \"exit 4\"\n",
    );

    let run = project
        .sy()
        .args(&["-o", "json", "batch", "jobs.toml"])
        .fails();

    let json = run.json();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["project"], "a");
    assert_eq!(rows[0]["state"], "succeeded");
    assert_eq!(rows[1]["project"], "b");
    assert_eq!(rows[1]["state"], "failed");
    assert_eq!(rows[1]["exit_status"]["code"], 4);
}

#[test]
fn batch_rejects_unknown_fields() {
    let project = Project::empty();
    project.file(
        "jobs.toml",
        "[[job]]\nproject = \"a\"\nrun = \"true\"\nretries = 3\n",
    );

    project
        .sy()
        .args(&["batch", "jobs.toml"])
        .fails()
        .stderr_has("invalid batch file");
}
