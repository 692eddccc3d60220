// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::kv::fake::FakeKvStore;
use std::sync::Arc;
use std::time::Duration;

fn lock() -> DistributedLock {
    DistributedLock::new(Arc::new(FakeKvStore::new()))
}

#[tokio::test]
async fn second_acquire_fails_while_first_holds() {
    let lock = lock();
    let token = lock.acquire("provision:chat-1", Duration::from_secs(60)).await.unwrap();
    assert!(token.is_some());
    assert!(lock.acquire("provision:chat-1", Duration::from_secs(60)).await.unwrap().is_none());
}

#[tokio::test]
async fn release_with_wrong_token_is_rejected() {
    let lock = lock();
    let token = lock.acquire("k", Duration::from_secs(60)).await.unwrap().unwrap();
    assert!(!lock.release("k", "not-the-token").await.unwrap());
    assert!(lock.release("k", &token).await.unwrap());
}

#[tokio::test]
async fn release_then_reacquire_succeeds() {
    let lock = lock();
    let token = lock.acquire("k", Duration::from_secs(60)).await.unwrap().unwrap();
    assert!(lock.release("k", &token).await.unwrap());
    assert!(lock.acquire("k", Duration::from_secs(60)).await.unwrap().is_some());
}

#[tokio::test]
async fn tokens_are_unique_across_acquisitions() {
    let lock = lock();
    let a = lock.acquire("k1", Duration::from_secs(60)).await.unwrap().unwrap();
    let b = lock.acquire("k2", Duration::from_secs(60)).await.unwrap().unwrap();
    assert_ne!(a, b);
}
