// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared adapter wiring for every subcommand. Grounded on `edw-daemon`'s
//! own `main.rs` construction order (config, then `RedisKvStore`, then the
//! things built on top of it) — the CLI is a second, read-mostly client of
//! the same storage, not a separate architecture.

use std::sync::Arc;

use anyhow::Result;
use edw_container::{BollardContainerDriver, ContainerDriver};
use edw_daemon::{Config, DriverLiveness};
use edw_engine::JobQueue;
use edw_storage::{RedisKvStore, RunEventLog, SandboxStore};

pub struct Context {
    pub queue: Arc<JobQueue>,
    pub run_log: Arc<RunEventLog>,
    pub sandbox_store: Arc<SandboxStore>,
}

impl Context {
    pub fn connect() -> Result<Self> {
        let config = Config::from_env()?;
        let kv = Arc::new(RedisKvStore::new(&config.redis_url)?);
        let driver: Arc<dyn ContainerDriver> = Arc::new(BollardContainerDriver::connect()?);
        let liveness = Arc::new(DriverLiveness(driver));
        Ok(Self {
            queue: Arc::new(JobQueue::new(kv.clone())),
            run_log: Arc::new(RunEventLog::new(kv.clone())),
            sandbox_store: Arc::new(SandboxStore::new(kv, liveness)),
        })
    }
}
