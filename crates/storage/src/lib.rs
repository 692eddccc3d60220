// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! edw-storage: the shared-state layer backing the distributed lock (C2),
//! per-user slot limiter (C3), sandbox state store (C4) and run event log
//! (C11). One `KvStore` trait, one Redis-backed adapter, one in-memory fake
//! — every other module in this crate is built purely in terms of that
//! trait, the same adapter-plus-fake split the teacher uses for its agent
//! adapters.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod kv;
pub mod limiter;
pub mod lock;
pub mod run_log;
pub mod sandbox_store;

pub use kv::{KvStore, RedisKvStore};
pub use limiter::SlotLimiter;
pub use lock::DistributedLock;
pub use run_log::RunEventLog;
pub use sandbox_store::{ContainerLiveness, SandboxStore};
