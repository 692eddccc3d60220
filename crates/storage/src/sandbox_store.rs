// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox state store (C4, spec §4.3). Keeps `sandbox:<id>` and
//! `chat:sandbox:<chatId>` as a TTL-paired primary record + index, plus an
//! optional `chat:framework:<chatId>` hint. `getActive` validates the
//! indexed container is actually alive (liveness answers cached 10s) and
//! drops stale index entries rather than returning them.

use crate::kv::KvStore;
use async_trait::async_trait;
use edw_core::{ChatId, Error, Sandbox, SandboxId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SANDBOX_TTL: Duration = Duration::from_secs(30 * 60);
const LIVENESS_CACHE_TTL: Duration = Duration::from_secs(10);

/// Asks whether a container is actually running. Implemented by the
/// container driver crate; kept as a trait here (rather than a dependency
/// on that crate) so this crate's only concern is state bookkeeping.
#[async_trait]
pub trait ContainerLiveness: Send + Sync {
    async fn is_running(&self, container_id: &str) -> Result<bool, Error>;
}

pub struct SandboxStore {
    kv: Arc<dyn KvStore>,
    liveness: Arc<dyn ContainerLiveness>,
    liveness_cache: Mutex<HashMap<String, (bool, Instant)>>,
}

impl SandboxStore {
    pub fn new(kv: Arc<dyn KvStore>, liveness: Arc<dyn ContainerLiveness>) -> Self {
        Self { kv, liveness, liveness_cache: Mutex::new(HashMap::new()) }
    }

    fn sandbox_key(id: &SandboxId) -> String {
        format!("sandbox:{id}")
    }

    fn chat_index_key(chat_id: &ChatId) -> String {
        format!("chat:sandbox:{chat_id}")
    }

    fn framework_key(chat_id: &ChatId) -> String {
        format!("chat:framework:{chat_id}")
    }

    /// Persists the sandbox record and the chat→sandbox index with equal
    /// TTL, and the framework hint if present.
    pub async fn upsert(&self, sandbox: &Sandbox) -> Result<(), Error> {
        let payload = serde_json::to_string(sandbox).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.set_with_ttl(&Self::sandbox_key(&sandbox.id), &payload, SANDBOX_TTL).await?;
        self.kv
            .set_with_ttl(&Self::chat_index_key(&sandbox.chat_id), sandbox.id.as_str(), SANDBOX_TTL)
            .await?;
        if let Some(framework) = &sandbox.scaffolded_framework {
            self.kv.set_with_ttl(&Self::framework_key(&sandbox.chat_id), framework, SANDBOX_TTL).await?;
        }
        Ok(())
    }

    /// Re-applies TTL to both the record and the index (spec §4.3: "both
    /// primary keys carry equal TTL"). Called on every sandbox activity.
    pub async fn refresh_ttl(&self, sandbox: &Sandbox) -> Result<(), Error> {
        self.kv.expire(&Self::sandbox_key(&sandbox.id), SANDBOX_TTL).await?;
        self.kv.expire(&Self::chat_index_key(&sandbox.chat_id), SANDBOX_TTL).await?;
        Ok(())
    }

    pub async fn get(&self, id: &SandboxId) -> Result<Option<Sandbox>, Error> {
        match self.kv.get(&Self::sandbox_key(id)).await? {
            Some(raw) => {
                serde_json::from_str(&raw).map(Some).map_err(|e| Error::Internal(e.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Looks up the chat's active sandbox via the index, confirms the
    /// backing container is alive, and drops the index entry (without
    /// erroring) if it isn't.
    pub async fn get_active(&self, chat_id: &ChatId) -> Result<Option<Sandbox>, Error> {
        let Some(sandbox_id_raw) = self.kv.get(&Self::chat_index_key(chat_id)).await? else {
            return Ok(None);
        };
        let sandbox_id = SandboxId::from_string(&sandbox_id_raw);
        let Some(sandbox) = self.get(&sandbox_id).await? else {
            self.kv.delete(&Self::chat_index_key(chat_id)).await?;
            return Ok(None);
        };
        if self.is_container_alive(&sandbox.container_id).await? {
            Ok(Some(sandbox))
        } else {
            self.kv.delete(&Self::chat_index_key(chat_id)).await?;
            self.kv.delete(&Self::sandbox_key(&sandbox_id)).await?;
            Ok(None)
        }
    }

    async fn is_container_alive(&self, container_id: &str) -> Result<bool, Error> {
        if let Some((alive, checked_at)) = self.liveness_cache.lock().get(container_id).copied() {
            if checked_at.elapsed() < LIVENESS_CACHE_TTL {
                return Ok(alive);
            }
        }
        let alive = self.liveness.is_running(container_id).await?;
        self.liveness_cache.lock().insert(container_id.to_string(), (alive, Instant::now()));
        Ok(alive)
    }

    pub async fn remove(&self, sandbox: &Sandbox) -> Result<(), Error> {
        self.kv.delete(&Self::sandbox_key(&sandbox.id)).await?;
        self.kv.delete(&Self::chat_index_key(&sandbox.chat_id)).await?;
        self.kv.delete(&Self::framework_key(&sandbox.chat_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sandbox_store_tests.rs"]
mod tests;
