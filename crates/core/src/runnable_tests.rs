// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_command_keeps_stored_commands_in_order() {
    let job = JobCommand::new("/srv/app", "echo hi").with_stored(["t", "echo hello"]);

    assert_eq!(job.command(), CommandLine::shell("t\necho hello\necho hi"));
}

#[test]
fn job_command_skips_blank_lines() {
    let job = JobCommand::new("/srv/app", "").with_stored(["make", "  "]);

    assert_eq!(job.command(), CommandLine::shell("make"));
}

#[test]
fn deploy_command_targets_its_reference() {
    let deploy = DeployCommand {
        stage: "staging".to_string(),
        commands: vec!["bundle".to_string(), "cap staging deploy".to_string()],
        reference: "v1.2.0".to_string(),
        cwd: PathBuf::from("/srv/app"),
    };

    let request = ExecutionRequest::from_runnable("app", &deploy, "deployer");

    assert_eq!(request.command, CommandLine::shell("bundle\ncap staging deploy"));
    assert_eq!(request.commit.as_deref(), Some("v1.2.0"));
    assert_eq!(request.cwd, PathBuf::from("/srv/app"));
    assert_eq!(request.project, "app");
}

#[test]
fn exec_command_displays_program_and_args() {
    let cmd = CommandLine::exec("git", ["fetch", "--prune"]);
    assert_eq!(cmd.to_string(), "git fetch --prune");
}

#[test]
fn command_line_serializes_tagged() {
    let json = serde_json::to_value(CommandLine::shell("ls")).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "shell", "script": "ls"}));
}
