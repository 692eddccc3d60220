// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn workdir() -> PathBuf {
    PathBuf::from("/home/node/edward")
}

#[test]
fn rejects_command_not_on_allow_list() {
    let err = validate("curl", &["http://x".to_string()], &workdir()).unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)));
}

#[test]
fn rejects_rm_rf_root() {
    let err = validate("rm", &["-rf".to_string(), "/".to_string()], &workdir()).unwrap_err();
    assert!(matches!(err, Error::DisallowedPattern(_)));
}

#[test]
fn rejects_chmod_and_chown() {
    assert!(validate("find", &[".".to_string(), "-name".to_string(), "chmod".to_string()], &workdir())
        .is_err());
}

#[test]
fn rejects_find_exec() {
    let err = validate("find", &[".".to_string(), "-exec".to_string(), "rm".to_string()], &workdir())
        .unwrap_err();
    assert!(matches!(err, Error::DisallowedPattern(_)));
}

#[test]
fn rejects_too_many_arguments() {
    let args: Vec<String> = (0..61).map(|i| i.to_string()).collect();
    let err = validate("echo", &args, &workdir()).unwrap_err();
    assert!(matches!(err, Error::InvalidArg(_)));
}

#[test]
fn rejects_control_characters() {
    let err = validate("echo", &["bad\x01arg".to_string()], &workdir()).unwrap_err();
    assert!(matches!(err, Error::InvalidArg(_)));
}

#[test]
fn rejects_path_escaping_workdir() {
    let err = validate("cat", &["../../etc/passwd".to_string()], &workdir()).unwrap_err();
    assert!(matches!(err, Error::PathEscape(_)));
}

#[test]
fn accepts_path_confined_to_workdir() {
    assert!(validate("cat", &["src/index.ts".to_string()], &workdir()).is_ok());
}

#[test]
fn rejects_rm_of_workdir_root() {
    let err = validate("rm", &["-rf".to_string(), ".".to_string()], &workdir()).unwrap_err();
    assert!(matches!(err, Error::PathEscape(_)));
}

#[test]
fn validates_k_equals_value_when_path_like() {
    let err = validate("find", &[".".to_string(), "-k=../../etc/passwd".to_string()], &workdir())
        .unwrap_err();
    assert!(matches!(err, Error::PathEscape(_)));
}

#[test]
fn allows_all_listed_commands() {
    for cmd in ALLOWED_COMMANDS {
        assert!(validate(cmd, &[], &workdir()).is_ok(), "{cmd} should be allowed with no args");
    }
}
