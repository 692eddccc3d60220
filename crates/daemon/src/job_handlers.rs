// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job handlers (C12, spec §4.11 + §4.7/§4.12): bridges each
//! [`JobPayload`] variant to the pipeline that actually does the work —
//! [`BuildPipeline`] for builds, the backup/restore primitives in
//! `edw-container` for backups, and the container driver plus sandbox
//! store for cleanups. Grounded on `edw-engine::worker`'s `JobHandler`
//! trait and on `BuildPipeline::publish_output`'s get-archive-then-
//! put-object shape for the backup handler.

use std::sync::Arc;

use async_trait::async_trait;
use edw_container::backup::{backup_archive_key, build_tar_gz, extract_tar_gz, strip_workdir_prefix};
use edw_container::snapshot::CandidateFile;
use edw_container::{ContainerDriver, ContainerHandle, ObjectStore, SANDBOX_WORKDIR};
use edw_core::job::JobPayload;
use edw_core::Error;
use edw_engine::{BuildPipeline, BuildRequest, DeploymentMode, JobHandler};
use edw_storage::SandboxStore;
use tracing::{info, warn};

/// Fetches the sandbox's container handle, running `build_id`/`run_id`
/// through [`BuildPipeline::run`] and letting its own `build_status`
/// publish carry the outcome — the handler itself only needs to
/// translate a queue failure into a retryable `Err`.
pub struct BuildJobHandler {
    sandbox_store: Arc<SandboxStore>,
    pipeline: Arc<BuildPipeline>,
    deployment_mode: DeploymentMode,
}

impl BuildJobHandler {
    pub fn new(sandbox_store: Arc<SandboxStore>, pipeline: Arc<BuildPipeline>, deployment_mode: DeploymentMode) -> Self {
        Self { sandbox_store, pipeline, deployment_mode }
    }
}

#[async_trait]
impl JobHandler for BuildJobHandler {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error> {
        let JobPayload::Build { sandbox_id, user_id, chat_id, run_id, build_id, .. } = payload else {
            return Err(Error::Internal("BuildJobHandler received a non-build payload".to_string()));
        };

        let sandbox = self
            .sandbox_store
            .get(sandbox_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no sandbox state for {sandbox_id}")))?;

        let outcome = self
            .pipeline
            .run(&BuildRequest {
                build_id: build_id.clone(),
                run_id: run_id.clone(),
                user_id: user_id.clone(),
                chat_id: chat_id.clone(),
                container: ContainerHandle { id: sandbox.container_id },
                workdir: SANDBOX_WORKDIR.to_string(),
                deployment_mode: self.deployment_mode,
            })
            .await?;

        info!(%sandbox_id, status = ?outcome.status, "build job finished");
        Ok(())
    }
}

/// Streams the sandbox workspace to `<userId>/<chatId>/source_backup.tar.gz`
/// (spec §4.7). The driver's raw `get_archive` tar carries the workdir as a
/// path prefix and no sensitive-path filtering, so the handler re-extracts
/// and rebuilds the archive — the same safety step `Provisioner::try_restore`
/// applies on the way back in.
pub struct BackupJobHandler {
    sandbox_store: Arc<SandboxStore>,
    driver: Arc<dyn ContainerDriver>,
    object_store: Arc<dyn ObjectStore>,
}

impl BackupJobHandler {
    pub fn new(sandbox_store: Arc<SandboxStore>, driver: Arc<dyn ContainerDriver>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self { sandbox_store, driver, object_store }
    }
}

#[async_trait]
impl JobHandler for BackupJobHandler {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error> {
        let JobPayload::Backup { sandbox_id, user_id, chat_id, reason } = payload else {
            return Err(Error::Internal("BackupJobHandler received a non-backup payload".to_string()));
        };

        let sandbox = self
            .sandbox_store
            .get(sandbox_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no sandbox state for {sandbox_id}")))?;
        let handle = ContainerHandle { id: sandbox.container_id };

        let raw = self.driver.get_archive(&handle, SANDBOX_WORKDIR).await?;
        let files: Vec<CandidateFile> = extract_tar_gz(&raw)?
            .into_iter()
            .map(|f| {
                let rel_path = strip_workdir_prefix(&f.rel_path, SANDBOX_WORKDIR).to_string();
                CandidateFile { size: f.contents.len() as u64, rel_path, contents: f.contents }
            })
            .collect();
        let archive = build_tar_gz(&files)?;

        let key = backup_archive_key(user_id.as_str(), chat_id.as_str());
        self.object_store.put_object(&key, archive, "application/gzip").await?;

        info!(%sandbox_id, ?reason, file_count = files.len(), "backed up sandbox workspace");
        Ok(())
    }
}

/// Destroys the sandbox's container and removes its state record (spec
/// §4.14's counterpart to provisioning). Destroy-then-remove, not the
/// reverse: a crash between the two steps leaves an orphan the
/// reconciliation sweep will clean up, never a live container with no
/// record a client could still be talking to.
pub struct CleanupJobHandler {
    sandbox_store: Arc<SandboxStore>,
    driver: Arc<dyn ContainerDriver>,
}

impl CleanupJobHandler {
    pub fn new(sandbox_store: Arc<SandboxStore>, driver: Arc<dyn ContainerDriver>) -> Self {
        Self { sandbox_store, driver }
    }
}

#[async_trait]
impl JobHandler for CleanupJobHandler {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error> {
        let JobPayload::Cleanup { sandbox_id, reason, .. } = payload else {
            return Err(Error::Internal("CleanupJobHandler received a non-cleanup payload".to_string()));
        };

        let Some(sandbox) = self.sandbox_store.get(sandbox_id).await? else {
            warn!(%sandbox_id, "cleanup job for a sandbox with no state record, nothing to do");
            return Ok(());
        };

        self.driver.destroy(&sandbox.container_id).await?;
        self.sandbox_store.remove(&sandbox).await?;
        info!(%sandbox_id, ?reason, "cleaned up sandbox");
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_handlers_tests.rs"]
mod tests;
