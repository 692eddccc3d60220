// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build status inspection. `BuildPipeline` publishes a `BuildStatus` event
//! onto the run's own event log rather than a separate build-status store
//! (spec §4.10/§4.12), so this just scans that log for the latest one.

use anyhow::Result;
use clap::Subcommand;
use edw_core::RunId;
use edw_wire::StreamEvent;

use crate::context::Context;
use crate::exit_error::ExitError;

#[derive(Subcommand)]
pub enum BuildCommand {
    /// Print the most recent build status published on a run's event log.
    Status { run_id: String },
}

pub async fn handle(cmd: BuildCommand) -> Result<()> {
    let ctx = Context::connect()?;
    match cmd {
        BuildCommand::Status { run_id } => {
            let run_id = RunId::from_string(&run_id);
            let events = ctx.run_log.read_after(&run_id, 0, None).await?;
            let latest = events.into_iter().rev().find_map(|record| match record.event {
                StreamEvent::BuildStatus { build_id, status, preview_url, error_log, .. } => {
                    Some((build_id, status, preview_url, error_log))
                }
                _ => None,
            });
            match latest {
                Some((build_id, status, preview_url, error_log)) => {
                    println!("build {build_id}: {status}");
                    if let Some(url) = preview_url {
                        println!("  preview: {url}");
                    }
                    if let Some(log) = error_log {
                        println!("  error log:\n{log}");
                    }
                }
                None => return Err(ExitError::new(1, format!("no build status recorded for run {run_id}")).into()),
            }
        }
    }
    Ok(())
}
