// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox identifier and record (spec §3 `Sandbox`).
//!
//! A sandbox is an ephemeral per-chat container workspace. At most one
//! sandbox is live per chat at a time — enforced by the provisioning lock
//! (storage crate) plus the chat→sandbox index, not by anything in this type.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

crate::define_id! {
    /// Unique identifier for a sandbox instance.
    pub struct SandboxId("sbx-");
}

/// Opaque user identifier, owned by the (out-of-scope) auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Opaque chat identifier, owned by the (out-of-scope) persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(UserId);
string_id!(ChatId);

/// A live sandbox's materialized record, as stored by the sandbox state
/// store (storage crate) and returned by the container driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sandbox {
    pub id: SandboxId,
    pub container_id: String,
    pub user_id: UserId,
    pub chat_id: ChatId,
    /// Epoch-millisecond expiry; refreshed on activity (spec §4.3).
    pub expires_at_epoch_ms: u64,
    #[serde(default)]
    pub scaffolded_framework: Option<String>,
    #[serde(default)]
    pub requested_packages: Option<Vec<String>>,
}

impl Sandbox {
    pub fn is_expired(&self, now_epoch_ms: u64) -> bool {
        now_epoch_ms >= self.expires_at_epoch_ms
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct SandboxBuilder => Sandbox {
        into {
            container_id: String = "container-1",
            user_id: UserId = UserId::new("user-1"),
            chat_id: ChatId = ChatId::new("chat-1"),
        }
        set { expires_at_epoch_ms: u64 = 1_800_000 }
        option {
            scaffolded_framework: String = None,
            requested_packages: Vec<String> = None,
        }
        computed { id: SandboxId = SandboxId::new() }
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
