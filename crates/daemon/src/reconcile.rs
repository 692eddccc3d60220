// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox reconciliation (spec §4.14 step 4): a background sweep that
//! destroys containers labelled `sandbox=true` with no corresponding live
//! state record. Grounded on the teacher's `lifecycle/reconcile.rs`
//! startup-reconciliation pass, adapted from a one-shot startup check into
//! a periodic loop, and on `edw-engine`'s `WorkerPool::run` for the
//! `CancellationToken`-driven shutdown shape.

use std::sync::Arc;
use std::time::Duration;

use edw_container::ContainerDriver;
use edw_core::SandboxId;
use edw_storage::SandboxStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

pub struct Reconciler {
    driver: Arc<dyn ContainerDriver>,
    sandbox_store: Arc<SandboxStore>,
}

impl Reconciler {
    pub fn new(driver: Arc<dyn ContainerDriver>, sandbox_store: Arc<SandboxStore>) -> Self {
        Self { driver, sandbox_store }
    }

    /// Runs one reconciliation pass: any `sandbox=true` container whose
    /// `sandboxId` label has no live state record is destroyed. Returns
    /// the number of containers destroyed.
    pub async fn sweep(&self) -> usize {
        let containers = match self.driver.list_sandbox_containers().await {
            Ok(containers) => containers,
            Err(error) => {
                warn!(%error, "reconciliation sweep could not list sandbox containers");
                return 0;
            }
        };

        let mut destroyed = 0;
        for container in containers {
            let sandbox_id = SandboxId::from_string(&container.sandbox_id);
            match self.sandbox_store.get(&sandbox_id).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, sandbox_id = %container.sandbox_id, "reconciliation could not look up sandbox state, skipping");
                    continue;
                }
            }

            match self.driver.destroy(&container.container_id).await {
                Ok(()) => {
                    destroyed += 1;
                    info!(container_id = %container.container_id, sandbox_id = %container.sandbox_id, "destroyed orphaned sandbox container");
                }
                Err(error) => warn!(%error, container_id = %container.container_id, "failed to destroy orphaned sandbox container"),
            }
        }
        destroyed
    }

    /// Runs [`Self::sweep`] every [`RECONCILE_INTERVAL`] until `cancel`
    /// fires.
    pub async fn run(&self, cancel: &CancellationToken) {
        let mut interval = tokio::time::interval(RECONCILE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                _ = cancel.cancelled() => return,
            }
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
