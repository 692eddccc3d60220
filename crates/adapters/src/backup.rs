// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup & restore (C8, spec §4.7). Packs a workspace into a tar.gz
//! (excluding ephemera and anything that looks like a credential) plus a
//! companion gzipped JSON snapshot, and can unpack a tar.gz back onto disk.

use edw_core::Error;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Read;
use std::path::{Component, Path};

use crate::snapshot::CandidateFile;

/// Segments/files never written into a backup archive, on top of the
/// ordinary workspace exclusion list (spec §4.7).
const SENSITIVE_EXACT: &[&str] = &[
    ".npmrc",
    ".yarnrc",
    ".yarnrc.yml",
    ".pypirc",
    ".netrc",
    ".dockercfg",
    ".dockerconfigjson",
    "id_rsa",
    "id_rsa.pub",
    "id_ed25519",
    "id_ed25519.pub",
    "id_ecdsa",
    "id_ecdsa.pub",
    "id_dsa",
    "id_dsa.pub",
];
const SENSITIVE_EXTENSIONS: &[&str] = &[".pem", ".key", ".p12", ".pfx"];
const ENV_ALLOWLIST: &[&str] = &[".env.example", ".env.sample", ".env.template", ".env.dist"];

pub fn backup_archive_key(user_id: &str, chat_id: &str) -> String {
    format!("{user_id}/{chat_id}/source_backup.tar.gz")
}

pub fn backup_snapshot_key(user_id: &str, chat_id: &str) -> String {
    format!("{user_id}/{chat_id}/source_snapshot.json.gz")
}

/// True if this relative path must be left out of a backup archive: inside
/// `.git`/`.ssh`/`.aws`, a known credential filename, or an `.env*` file
/// that isn't one of the example/template variants.
pub fn is_sensitive_path(rel_path: &str) -> bool {
    let segments: Vec<&str> = rel_path.split('/').collect();
    if segments.iter().any(|s| matches!(*s, ".git" | ".ssh" | ".aws")) {
        return true;
    }
    let basename = segments.last().copied().unwrap_or(rel_path);
    if SENSITIVE_EXACT.contains(&basename) {
        return true;
    }
    if SENSITIVE_EXTENSIONS.iter().any(|ext| basename.ends_with(ext)) {
        return true;
    }
    if basename.starts_with(".env") && !ENV_ALLOWLIST.contains(&basename) {
        return true;
    }
    if rel_path.contains("/.aws/credentials") || basename == "credentials" && segments.iter().any(|s| *s == ".aws") {
        return true;
    }
    false
}

/// Rejects paths that could escape the workspace root once extracted:
/// absolute paths, `..` components, backslashes, NUL bytes, doubled
/// slashes (spec §4.7).
pub fn validate_archive_path(rel_path: &str) -> Result<(), Error> {
    if rel_path.is_empty() {
        return Err(Error::PathEscape("empty archive path".to_string()));
    }
    if rel_path.contains('\\') || rel_path.contains('\0') || rel_path.contains("//") {
        return Err(Error::PathEscape(rel_path.to_string()));
    }
    let path = Path::new(rel_path);
    if path.is_absolute() {
        return Err(Error::PathEscape(rel_path.to_string()));
    }
    for component in path.components() {
        match component {
            Component::ParentDir => return Err(Error::PathEscape(rel_path.to_string())),
            Component::Normal(_) | Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return Err(Error::PathEscape(rel_path.to_string())),
        }
    }
    Ok(())
}

/// Strips a sandbox workdir prefix (e.g. `/home/node/edward/`) off an
/// absolute in-container path, producing the relative path stored in the
/// archive.
pub fn strip_workdir_prefix<'a>(absolute_path: &'a str, workdir: &str) -> &'a str {
    let prefix = if workdir.ends_with('/') { workdir.to_string() } else { format!("{workdir}/") };
    absolute_path.strip_prefix(prefix.as_str()).unwrap_or(absolute_path)
}

/// Builds a gzip-compressed tar archive from the given files, skipping any
/// file flagged by [`is_sensitive_path`]. Archive entries use each file's
/// `rel_path` verbatim, so callers must already have normalized/stripped
/// workdir prefixes.
pub fn build_tar_gz(files: &[CandidateFile]) -> Result<Vec<u8>, Error> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for file in files {
        if is_sensitive_path(&file.rel_path) {
            continue;
        }
        validate_archive_path(&file.rel_path)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(file.contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, &file.rel_path, file.contents.as_slice())
            .map_err(|e| Error::Internal(format!("tar append failed: {e}")))?;
    }
    let encoder = builder.into_inner().map_err(|e| Error::Internal(format!("tar finish failed: {e}")))?;
    encoder.finish().map_err(|e| Error::Internal(format!("gzip finish failed: {e}")))
}

/// One entry recovered from [`extract_tar_gz`].
pub struct ExtractedFile {
    pub rel_path: String,
    pub contents: Vec<u8>,
}

/// Unpacks a gzip-compressed tar archive into memory, validating every
/// entry's path before accepting it (defense against a maliciously crafted
/// archive escaping the restore target).
pub fn extract_tar_gz(archive: &[u8]) -> Result<Vec<ExtractedFile>, Error> {
    let decoder = GzDecoder::new(archive);
    let mut tar_reader = tar::Archive::new(decoder);
    let mut out = Vec::new();
    let entries = tar_reader.entries().map_err(|e| Error::Internal(format!("tar read failed: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::Internal(format!("tar entry read failed: {e}")))?;
        let path = entry.path().map_err(|e| Error::Internal(format!("tar path read failed: {e}")))?;
        let rel_path = path.to_string_lossy().into_owned();
        validate_archive_path(&rel_path)?;
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(|e| Error::Internal(format!("tar entry body read failed: {e}")))?;
        out.push(ExtractedFile { rel_path, contents });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
