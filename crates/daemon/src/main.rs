// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Odd Jobs daemon entry point: wires every adapter from config, starts
//! the worker pool and the sandbox reconciliation loop, and drains both
//! gracefully on shutdown. HTTP/SSE transport is an external caller's
//! concern (out of scope here); this process only owns the background
//! machinery that caller drives.

use std::sync::Arc;

use edw_container::{BollardContainerDriver, ContainerDriver, ObjectStore, S3ObjectStore};
use edw_daemon::job_handlers::{BackupJobHandler, BuildJobHandler, CleanupJobHandler};
use edw_daemon::{logging, Config, DriverLiveness, Reconciler};
use edw_engine::{BuildPipeline, EdgeKvClient, HttpEdgeKvClient, JobQueue, PreviewConfig, WorkerPool};
use edw_storage::{RedisKvStore, RunEventLog, SandboxStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = Config::from_env()?;

    let kv = Arc::new(RedisKvStore::new(&config.redis_url)?);
    let driver: Arc<dyn ContainerDriver> = Arc::new(BollardContainerDriver::connect()?);
    let object_store: Arc<dyn ObjectStore> =
        Arc::new(S3ObjectStore::connect(config.s3_bucket.clone(), config.cdn_invalidation_url.clone(), config.cdn_api_token.clone()).await);
    let edge_kv: Arc<dyn EdgeKvClient> = Arc::new(HttpEdgeKvClient::new(config.cloudflare_kv_put_url_base.clone(), config.cloudflare_api_token.clone()));

    let liveness = Arc::new(DriverLiveness(driver.clone()));
    let sandbox_store = Arc::new(SandboxStore::new(kv.clone(), liveness));
    let run_log = Arc::new(RunEventLog::new(kv.clone()));
    let queue = Arc::new(JobQueue::new(kv.clone()));

    let preview_config = PreviewConfig {
        mode: config.deployment_mode,
        root_domain: config.preview_root_domain.clone(),
        cloudfront_base: config.cloudfront_distribution_url.clone(),
    };
    let build_pipeline = Arc::new(BuildPipeline::new(driver.clone(), object_store.clone(), edge_kv, run_log, preview_config));

    let build_handler = Arc::new(BuildJobHandler::new(sandbox_store.clone(), build_pipeline, config.deployment_mode));
    let backup_handler = Arc::new(BackupJobHandler::new(sandbox_store.clone(), driver.clone(), object_store.clone()));
    let cleanup_handler = Arc::new(CleanupJobHandler::new(sandbox_store.clone(), driver.clone()));
    let worker_pool = WorkerPool::new(queue, build_handler, backup_handler, cleanup_handler);

    let reconciler = Reconciler::new(driver, sandbox_store);

    info!(worker_concurrency = config.worker_concurrency, "odd jobs daemon starting");

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "failed to install Ctrl+C handler");
        }
        info!("shutdown signal received, draining in-flight work");
        shutdown.cancel();
    });

    let (processed, _) = tokio::join!(worker_pool.run(&cancel), reconciler.run(&cancel));
    info!(processed, "odd jobs daemon stopped");
    Ok(())
}
