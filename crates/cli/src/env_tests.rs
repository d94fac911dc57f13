// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial(env)]
fn requester_prefers_explicit_setting() {
    std::env::set_var("SY_REQUESTER", "release-bot");
    std::env::set_var("USER", "alice");
    assert_eq!(requester(), "release-bot");
    std::env::remove_var("SY_REQUESTER");
}

#[test]
#[serial(env)]
fn requester_falls_back_to_user_then_cli() {
    let user = std::env::var("USER").ok();
    std::env::remove_var("SY_REQUESTER");

    std::env::set_var("USER", "alice");
    assert_eq!(requester(), "alice");

    std::env::set_var("USER", "");
    assert_eq!(requester(), "cli");

    match user {
        Some(user) => std::env::set_var("USER", user),
        None => std::env::remove_var("USER"),
    }
}

#[test]
#[serial(env)]
fn empty_shell_is_unset() {
    std::env::set_var("SY_SHELL", "");
    assert_eq!(shell(), None);
    std::env::set_var("SY_SHELL", "/bin/zsh");
    assert_eq!(shell().as_deref(), Some("/bin/zsh"));
    std::env::remove_var("SY_SHELL");
}
