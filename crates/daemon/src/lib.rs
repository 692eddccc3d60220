// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Odd Jobs daemon library
//!
//! Background process wiring for sandbox provisioning, job execution, and
//! reconciliation. HTTP/SSE transport is out of scope here (an external
//! caller owns the wire surface); this crate exposes the pieces that
//! caller wires up: a [`Provisioner`] for sandbox lifecycle, job handlers
//! for the worker pool, a [`Reconciler`] for orphaned-container cleanup,
//! and env-driven [`Config`] loading.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod job_handlers;
pub mod logging;
pub mod provision;
pub mod reconcile;

pub use config::{Config, TrustProxy};
pub use job_handlers::{BackupJobHandler, BuildJobHandler, CleanupJobHandler};
pub use provision::{DriverLiveness, Provisioner};
pub use reconcile::Reconciler;
