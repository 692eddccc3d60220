// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn file(rel_path: &str, contents: &str) -> CandidateFile {
    CandidateFile { rel_path: rel_path.to_string(), size: contents.len() as u64, contents: contents.as_bytes().to_vec() }
}

#[test]
fn excludes_node_modules_and_dotgit() {
    assert!(is_excluded_path("node_modules/react/index.js", &[]));
    assert!(is_excluded_path(".git/HEAD", &[]));
    assert!(!is_excluded_path("src/index.ts", &[]));
}

#[test]
fn snapshot_excludes_preview_segments_but_prompt_selection_does_not() {
    assert!(is_excluded_path("preview/index.html", &["preview"]));
    assert!(!is_excluded_path("preview/index.html", &[]));
}

#[test]
fn text_extension_check_matches_known_list() {
    assert!(has_text_extension("src/app.tsx"));
    assert!(!has_text_extension("logo.png"));
}

#[test]
fn binary_detection_looks_at_first_2048_bytes() {
    let mut contents = vec![b'a'; 100];
    contents.push(0);
    assert!(looks_binary(&contents));
    assert!(!looks_binary(b"plain text"));
}

#[test]
fn selection_prioritizes_package_json_and_caps_file_count() {
    let files = vec![file("src/a.ts", "a"), file("package.json", "{}"), file("src/b.ts", "b")];
    let limits = SelectionLimits { max_files: 2, max_total_bytes: 1_000_000, max_file_bytes: 1_000 };
    let selected = select_for_prompt(&files, &limits);
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].rel_path, "package.json");
}

#[test]
fn selection_skips_binary_files_for_prompt() {
    let mut binary = file("logo.svg", "");
    binary.contents = vec![0, 1, 2];
    let files = vec![binary];
    let selected = select_for_prompt(&files, &SelectionLimits::default());
    assert!(selected.is_empty());
}

#[test]
fn selection_respects_total_byte_budget() {
    let files = vec![file("a.ts", &"x".repeat(600)), file("b.ts", &"y".repeat(600))];
    let limits = SelectionLimits { max_files: 10, max_total_bytes: 1000, max_file_bytes: 10_000 };
    let selected = select_for_prompt(&files, &limits);
    assert_eq!(selected.len(), 1);
}

#[test]
fn snapshot_keeps_binary_files_base64_encoded() {
    let mut binary = file("logo.png", "");
    binary.contents = vec![0, 1, 2, 255];
    let snapshot = SandboxSnapshot::build(&[binary], 1_000);
    assert_eq!(snapshot.file_count, 1);
    assert!(snapshot.files.contains_key("logo.png"));
}
