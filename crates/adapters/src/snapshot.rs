// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File selection & snapshot (C7, spec §4.6). Selects which workspace
//! files are worth sending to the LLM or persisting as a fast-path restore
//! snapshot, honoring exclusion, extension, priority and size rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EXCLUDED_SEGMENTS: &[&str] =
    &["node_modules", ".next", "dist", "build", "out", ".git", ".cache", "coverage", ".turbo", ".vercel"];
const SNAPSHOT_EXTRA_EXCLUDED_SEGMENTS: &[&str] = &[".output", "preview", "previews"];

const TEXT_EXTENSIONS: &[&str] =
    &[".ts", ".tsx", ".js", ".jsx", ".json", ".css", ".scss", ".html", ".md", ".yml", ".yaml", ".toml", ".env", ".mjs", ".cjs", ".svg", ".txt"];

const PRIORITY_BASENAMES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "next.config.js",
    "next.config.ts",
    "next.config.mjs",
    "vite.config.ts",
    "vite.config.js",
    "tailwind.config.js",
    "tailwind.config.ts",
];
const PRIORITY_SEGMENTS: &[&str] = &["app", "pages", "src"];

/// File selection pass for the continuation prompt: up to 500 files /
/// 5 MiB total, 512 KiB per file, priority (layout/entry/config) files
/// read first.
pub struct SelectionLimits {
    pub max_files: usize,
    pub max_total_bytes: u64,
    pub max_file_bytes: u64,
}

/// Broader selection for the restore snapshot: up to 2000 files / 20 MiB
/// total, with extra excluded segments.
pub struct SnapshotLimits {
    pub max_files: usize,
    pub max_total_bytes: u64,
    pub max_file_bytes: u64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self { max_files: 500, max_total_bytes: 5 * 1024 * 1024, max_file_bytes: 512 * 1024 }
    }
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self { max_files: 2000, max_total_bytes: 20 * 1024 * 1024, max_file_bytes: 512 * 1024 }
    }
}

/// One candidate file discovered by a workspace walk, before selection.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub rel_path: String,
    pub size: u64,
    pub contents: Vec<u8>,
}

pub fn is_excluded_path(rel_path: &str, extra_segments: &[&str]) -> bool {
    let segments = rel_path.split('/');
    segments
        .into_iter()
        .any(|segment| EXCLUDED_SEGMENTS.contains(&segment) || extra_segments.contains(&segment))
}

pub fn has_text_extension(rel_path: &str) -> bool {
    TEXT_EXTENSIONS.iter().any(|ext| rel_path.ends_with(ext))
}

fn is_priority(rel_path: &str) -> bool {
    let basename = rel_path.rsplit('/').next().unwrap_or(rel_path);
    if PRIORITY_BASENAMES.contains(&basename) {
        return true;
    }
    rel_path.split('/').next().map(|top| PRIORITY_SEGMENTS.contains(&top)).unwrap_or(false)
}

/// A NUL byte in the first 2048 bytes marks a file as binary (spec §4.6).
pub fn looks_binary(contents: &[u8]) -> bool {
    contents.iter().take(2048).any(|b| *b == 0)
}

/// Selects files for the continuation prompt. Binary files are skipped
/// outright (this path only feeds plain-text context to the LLM).
pub fn select_for_prompt(files: &[CandidateFile], limits: &SelectionLimits) -> Vec<CandidateFile> {
    select(files, &[], limits.max_files, limits.max_total_bytes, limits.max_file_bytes, false)
}

/// Selects files for `SandboxSnapshot` (spec §3): binary files are
/// base64-encoded rather than dropped, since the snapshot restores a full
/// workspace, not just LLM-visible context.
pub fn select_for_snapshot(files: &[CandidateFile], limits: &SnapshotLimits) -> Vec<CandidateFile> {
    select(files, SNAPSHOT_EXTRA_EXCLUDED_SEGMENTS, limits.max_files, limits.max_total_bytes, limits.max_file_bytes, true)
}

fn select(
    files: &[CandidateFile],
    extra_excluded: &[&str],
    max_files: usize,
    max_total_bytes: u64,
    max_file_bytes: u64,
    keep_binary: bool,
) -> Vec<CandidateFile> {
    let mut candidates: Vec<&CandidateFile> = files
        .iter()
        .filter(|f| !is_excluded_path(&f.rel_path, extra_excluded))
        .filter(|f| has_text_extension(&f.rel_path) || keep_binary)
        .filter(|f| f.size <= max_file_bytes)
        .filter(|f| keep_binary || !looks_binary(&f.contents))
        .collect();
    candidates.sort_by_key(|f| (!is_priority(&f.rel_path), f.rel_path.clone()));

    let mut selected = Vec::new();
    let mut total = 0u64;
    for file in candidates.drain(..) {
        if selected.len() >= max_files || total + file.size > max_total_bytes {
            continue;
        }
        total += file.size;
        selected.push(file.clone());
    }
    selected
}

/// On-disk snapshot format (spec §3 `SandboxSnapshot`): gzipped JSON of
/// `{version, generatedAt, fileCount, files}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxSnapshot {
    pub version: u32,
    pub generated_at_epoch_ms: u64,
    pub file_count: usize,
    pub files: BTreeMap<String, String>,
}

pub const SNAPSHOT_VERSION: u32 = 1;

impl SandboxSnapshot {
    pub fn build(files: &[CandidateFile], now_epoch_ms: u64) -> Self {
        let mut map = BTreeMap::new();
        for file in files {
            if looks_binary(&file.contents) {
                map.insert(file.rel_path.clone(), base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &file.contents));
            } else {
                map.insert(file.rel_path.clone(), String::from_utf8_lossy(&file.contents).into_owned());
            }
        }
        Self { version: SNAPSHOT_VERSION, generated_at_epoch_ms: now_epoch_ms, file_count: map.len(), files: map }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
