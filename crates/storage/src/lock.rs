// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed lock (C2, spec §4.1): atomic set-if-absent acquire, token
//! comparison on release so a lock re-acquired by someone else after TTL
//! expiry can't be stolen back.

use crate::kv::KvStore;
use edw_core::Error;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

pub struct DistributedLock {
    store: Arc<dyn KvStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Atomic set-if-absent. Returns the holder's token on success, `None`
    /// on contention. Callers MUST treat operations performed past `ttl` as
    /// possibly concurrent with a new holder (spec §4.1).
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<String>, Error> {
        let token = random_token();
        let acquired = self.store.set_if_not_exists(&lock_key(key), &token, ttl).await?;
        Ok(acquired.then_some(token))
    }

    /// Releases the lock only if `token` still matches the stored value.
    pub async fn release(&self, key: &str, token: &str) -> Result<bool, Error> {
        self.store.delete_if_value_matches(&lock_key(key), token).await
    }
}

fn lock_key(key: &str) -> String {
    format!("lock:{key}")
}

fn random_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
