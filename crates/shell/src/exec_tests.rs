// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn workdir() -> PathBuf {
    std::env::temp_dir()
}

#[tokio::test]
async fn runs_an_allowed_command_and_captures_stdout() {
    let output = exec("echo", &["hello".to_string()], &workdir()).await.unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("hello"));
}

#[tokio::test]
async fn rejects_command_not_on_allow_list_before_spawning() {
    let err = exec("curl", &["http://example.com".to_string()], &workdir()).await.unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)));
}

#[tokio::test]
async fn truncate_marks_oversized_output() {
    let big = vec![b'a'; DEFAULT_STDOUT_LIMIT + 10];
    let out = truncate(&big, DEFAULT_STDOUT_LIMIT);
    assert!(out.ends_with(TRUNCATION_MARKER));
    assert!(out.len() <= DEFAULT_STDOUT_LIMIT + TRUNCATION_MARKER.len());
}

#[tokio::test]
async fn truncate_leaves_small_output_untouched() {
    let out = truncate(b"hi", DEFAULT_STDOUT_LIMIT);
    assert_eq!(out, "hi");
}
