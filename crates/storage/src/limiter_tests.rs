// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::kv::fake::FakeKvStore;
use std::sync::Arc;

fn limiter(max: i64) -> SlotLimiter {
    SlotLimiter::new(Arc::new(FakeKvStore::new()), max)
}

#[tokio::test]
async fn allows_up_to_max_concurrent_slots() {
    let limiter = limiter(2);
    assert!(limiter.acquire("u1").await);
    assert!(limiter.acquire("u1").await);
    assert!(!limiter.acquire("u1").await);
}

#[tokio::test]
async fn release_frees_a_slot_for_reuse() {
    let limiter = limiter(1);
    assert!(limiter.acquire("u1").await);
    assert!(!limiter.acquire("u1").await);
    limiter.release("u1").await;
    assert!(limiter.acquire("u1").await);
}

#[tokio::test]
async fn slots_are_scoped_per_user() {
    let limiter = limiter(1);
    assert!(limiter.acquire("u1").await);
    assert!(limiter.acquire("u2").await);
}

#[tokio::test]
async fn with_releases_slot_on_success_and_rejects_when_exhausted() {
    let limiter = limiter(1);
    let result = limiter.with("u1", || async { 42 }).await.unwrap();
    assert_eq!(result, 42);
    // slot released after the closure ran, so a fresh acquire still succeeds
    assert!(limiter.acquire("u1").await);
}

#[tokio::test]
async fn with_fails_with_rate_limited_when_no_slot_available() {
    let limiter = limiter(1);
    assert!(limiter.acquire("u1").await);
    let err = limiter.with("u1", || async { () }).await.unwrap_err();
    assert!(matches!(err, edw_core::Error::RateLimited));
}
