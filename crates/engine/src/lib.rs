// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! edw-engine: the run-time core — stream parser (C9), agent loop (C10),
//! job queue & workers (C12), build pipeline (C13), preview routing (C14),
//! package registry resolver (C16) and build diagnostics (C18).

pub mod agent_loop;
pub mod build;
pub mod diagnostics;
pub mod llm;
pub mod parser;
pub mod preview;
pub mod queue;
pub mod registry;
pub mod worker;

pub use agent_loop::{AgentLoop, LoopOutcome, RunContext};
pub use build::{BuildOutcome, BuildPipeline, BuildRequest, PackageManager};
pub use diagnostics::{extract_diagnostics, Diagnostic, Severity};
pub use llm::{LlmClient, ToolCallRequest, TurnOutput};
pub use parser::StreamParser;
pub use preview::{derive_subdomain, route_preview, sanitize, DeploymentMode, EdgeKvClient, HttpEdgeKvClient, PreviewConfig};
pub use queue::{default_retry_policy, Backoff, JobQueue, QueueItem, RetryPolicy};
pub use registry::{InvalidPackage, RegistryResolver, ResolutionResult, ResolvedPackage, VersionConflict};
pub use worker::{JobHandler, WorkerPool, WORKER_CONCURRENCY};
