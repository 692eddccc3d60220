// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user slot limiter (C3, spec §4.2): bounds concurrent agent runs per
//! user. Fails closed on KV error — an unavailable store must not let
//! concurrency limits silently lapse.

use crate::kv::KvStore;
use edw_core::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub struct SlotLimiter {
    store: Arc<dyn KvStore>,
    max_concurrent_per_user: i64,
}

impl SlotLimiter {
    pub fn new(store: Arc<dyn KvStore>, max_concurrent_per_user: i64) -> Self {
        Self { store, max_concurrent_per_user }
    }

    fn key(user_id: &str) -> String {
        format!("slots:{user_id}")
    }

    /// Increments the user's slot counter; on first increment sets a 300s
    /// TTL so a crashed holder doesn't wedge the limit forever. Fails
    /// closed: any KV error is treated as "no slot available".
    pub async fn acquire(&self, user_id: &str) -> bool {
        let key = Self::key(user_id);
        let count = match self.store.incr_with_ttl_on_create(&key, DEFAULT_TTL).await {
            Ok(count) => count,
            Err(_) => return false,
        };
        if count > self.max_concurrent_per_user {
            let _ = self.store.decr_and_reap(&key).await;
            return false;
        }
        true
    }

    pub async fn release(&self, user_id: &str) {
        let _ = self.store.decr_and_reap(&Self::key(user_id)).await;
    }

    /// Acquires a slot, runs `f`, releases on every exit path (spec §4.9
    /// step 1). Fails with `RateLimited` if no slot is available.
    pub async fn with<T, F, Fut>(&self, user_id: &str, f: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.acquire(user_id).await {
            return Err(Error::RateLimited);
        }
        let result = f().await;
        self.release(user_id).await;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
