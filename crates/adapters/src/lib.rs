// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container driver, file selection/snapshot, backup, secret-envelope, and
//! preview-storage adapters (C5, C7, C8, C13 storage step, C17).

pub mod backup;
pub mod driver;
pub mod object_store;
pub mod secret;
pub mod snapshot;

pub use backup::{backup_archive_key, backup_snapshot_key, build_tar_gz, extract_tar_gz, is_sensitive_path, ExtractedFile};
pub use driver::{BollardContainerDriver, ContainerDriver, ContainerHandle, ExecOptions, ExecResult, FileEntry, SandboxContainer, SANDBOX_WORKDIR};
pub use object_store::{ObjectStore, S3ObjectStore};
pub use secret::{decrypt_secret, encrypt_secret, is_secret_envelope};
pub use snapshot::{select_for_prompt, select_for_snapshot, CandidateFile, SandboxSnapshot, SelectionLimits, SnapshotLimits};
