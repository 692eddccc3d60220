// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builder_produces_sane_defaults() {
    let sandbox = Sandbox::builder().build();
    assert_eq!(sandbox.user_id.as_str(), "user-1");
    assert_eq!(sandbox.chat_id.as_str(), "chat-1");
    assert!(sandbox.scaffolded_framework.is_none());
}

#[test]
fn expiry_is_epoch_ms_comparison() {
    let sandbox = Sandbox::builder().expires_at_epoch_ms(1_000).build();
    assert!(!sandbox.is_expired(999));
    assert!(sandbox.is_expired(1_000));
    assert!(sandbox.is_expired(1_001));
}

#[test]
fn user_id_and_chat_id_borrow_as_str() {
    use std::collections::HashSet;
    let mut set: HashSet<UserId> = HashSet::new();
    set.insert(UserId::new("user-42"));
    assert!(set.contains("user-42"));
}

#[test]
fn sandbox_id_carries_prefix() {
    let id = SandboxId::new();
    assert!(id.as_str().starts_with("sbx-"));
}
