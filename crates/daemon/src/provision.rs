// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox provisioning (spec §4.14): the orchestration glue across the
//! sandbox state store (C4), the container driver (C5), and backup/restore
//! (C8) that the individual crates deliberately don't wire together
//! themselves. Grounded on `edw-engine`'s `AgentLoop<C: Clock>` for the
//! generic-clock shape and on its `queue.rs`/`worker.rs` retry-with-backoff
//! idiom for the lock-contention loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edw_container::backup::{backup_archive_key, build_tar_gz, extract_tar_gz};
use edw_container::snapshot::CandidateFile;
use edw_container::{ContainerDriver, ContainerHandle, ObjectStore, SANDBOX_WORKDIR};
use edw_core::clock::Clock;
use edw_core::{ChatId, Error, Sandbox, SandboxId, UserId};
use edw_storage::sandbox_store::ContainerLiveness;
use edw_storage::{DistributedLock, SandboxStore};
use tracing::{info, warn};

/// Adapts any [`ContainerDriver`] to [`ContainerLiveness`] so
/// [`SandboxStore`] doesn't need to depend on the container-driver crate
/// directly — it only needs to ask "is this ID alive".
pub struct DriverLiveness(pub Arc<dyn ContainerDriver>);

#[async_trait]
impl ContainerLiveness for DriverLiveness {
    async fn is_running(&self, container_id: &str) -> Result<bool, Error> {
        self.0.is_running(container_id).await
    }
}

const PROVISION_LOCK_TTL: Duration = Duration::from_secs(60);
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);
const LOCK_POLL_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_LOCK_ATTEMPTS: u32 = 10;
const SANDBOX_TTL_MS: u64 = 30 * 60 * 1000;

fn provision_lock_key(chat_id: &ChatId) -> String {
    format!("provision:{chat_id}")
}

/// Small jittered backoff between lock-contention retries (200-500ms per
/// spec §4.14 step 3), grounded on `edw-storage`'s `DistributedLock` token
/// generation for its source of randomness.
fn jittered_backoff() -> Duration {
    use rand::RngCore;
    let mut bytes = [0u8; 1];
    rand::thread_rng().fill_bytes(&mut bytes);
    Duration::from_millis(200 + (bytes[0] as u64 * 300 / 255))
}

pub struct Provisioner<C: Clock> {
    sandbox_store: Arc<SandboxStore>,
    lock: Arc<DistributedLock>,
    driver: Arc<dyn ContainerDriver>,
    object_store: Arc<dyn ObjectStore>,
    clock: C,
}

impl<C: Clock> Provisioner<C> {
    pub fn new(sandbox_store: Arc<SandboxStore>, lock: Arc<DistributedLock>, driver: Arc<dyn ContainerDriver>, object_store: Arc<dyn ObjectStore>, clock: C) -> Self {
        Self { sandbox_store, lock, driver, object_store, clock }
    }

    /// Provisions (or returns the existing) sandbox for `(user_id,
    /// chat_id)`, per spec §4.14 steps 1-3. Reconciliation (step 4) is a
    /// separate background task (see `reconcile.rs`).
    pub async fn provision(&self, user_id: &UserId, chat_id: &ChatId) -> Result<SandboxId, Error> {
        if let Some(sandbox) = self.sandbox_store.get_active(chat_id).await? {
            self.sandbox_store.refresh_ttl(&sandbox).await?;
            return Ok(sandbox.id);
        }

        let lock_key = provision_lock_key(chat_id);
        for _ in 0..MAX_LOCK_ATTEMPTS {
            if let Some(token) = self.lock.acquire(&lock_key, PROVISION_LOCK_TTL).await? {
                let result = self.create_and_persist(user_id, chat_id).await;
                let _ = self.lock.release(&lock_key, &token).await;
                return result;
            }

            if let Some(sandbox) = self.wait_for_populated_index(chat_id).await? {
                return Ok(sandbox.id);
            }
            tokio::time::sleep(jittered_backoff()).await;
        }
        Err(Error::Conflict(format!("could not provision a sandbox for chat {chat_id}: lock contention exhausted {MAX_LOCK_ATTEMPTS} attempts")))
    }

    async fn wait_for_populated_index(&self, chat_id: &ChatId) -> Result<Option<Sandbox>, Error> {
        let deadline = self.clock.now() + LOCK_POLL_TIMEOUT;
        while self.clock.now() < deadline {
            if let Some(sandbox) = self.sandbox_store.get_active(chat_id).await? {
                return Ok(Some(sandbox));
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
        Ok(None)
    }

    async fn create_and_persist(&self, user_id: &UserId, chat_id: &ChatId) -> Result<SandboxId, Error> {
        // Re-check: another provisioner may have populated the index
        // between our failed acquire and this one succeeding.
        if let Some(sandbox) = self.sandbox_store.get_active(chat_id).await? {
            self.sandbox_store.refresh_ttl(&sandbox).await?;
            return Ok(sandbox.id);
        }

        let sandbox_id = SandboxId::new();
        let handle = self.driver.create(user_id, chat_id, sandbox_id.as_str()).await?;
        self.restore_backup_best_effort(user_id, chat_id, &handle).await;

        let sandbox = Sandbox {
            id: sandbox_id.clone(),
            container_id: handle.id,
            user_id: user_id.clone(),
            chat_id: chat_id.clone(),
            expires_at_epoch_ms: self.clock.epoch_ms() + SANDBOX_TTL_MS,
            scaffolded_framework: None,
            requested_packages: None,
        };
        self.sandbox_store.upsert(&sandbox).await?;
        Ok(sandbox_id)
    }

    /// Restore is best-effort (spec §4.14 step 3): a missing or corrupt
    /// backup must not fail provisioning, only skip the restore.
    async fn restore_backup_best_effort(&self, user_id: &UserId, chat_id: &ChatId, handle: &ContainerHandle) {
        match self.try_restore(user_id, chat_id, handle).await {
            Ok(true) => info!(%user_id, %chat_id, "restored backup into freshly provisioned sandbox"),
            Ok(false) => {}
            Err(error) => warn!(%user_id, %chat_id, %error, "best-effort backup restore failed, continuing with an empty sandbox"),
        }
    }

    async fn try_restore(&self, user_id: &UserId, chat_id: &ChatId, handle: &ContainerHandle) -> Result<bool, Error> {
        let key = backup_archive_key(user_id.as_str(), chat_id.as_str());
        let Some(archive) = self.object_store.get_object(&key).await? else {
            return Ok(false);
        };

        // Re-extract and rebuild the tar rather than uploading the fetched
        // bytes verbatim: `extract_tar_gz` runs `validate_archive_path` on
        // every entry, so a backup written by an older, less strict writer
        // can't smuggle a path-escaping entry into the container upload.
        let extracted = extract_tar_gz(&archive)?;
        let files: Vec<CandidateFile> =
            extracted.into_iter().map(|f| CandidateFile { size: f.contents.len() as u64, rel_path: f.rel_path, contents: f.contents }).collect();
        let sanitized = build_tar_gz(&files)?;
        self.driver.put_archive(handle, sanitized, SANDBOX_WORKDIR).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
