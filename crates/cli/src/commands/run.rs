// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run event history inspection (spec §4.10). Reads through the same
//! `RunEventLog::read_after` an SSE resumption client would call, just
//! printed instead of framed for the wire.

use anyhow::Result;
use clap::Subcommand;
use edw_core::RunId;
use edw_wire::encode_frame;

use crate::context::Context;

#[derive(Subcommand)]
pub enum RunCommand {
    /// Print every event recorded for a run, in order.
    Tail {
        run_id: String,
        /// Only show events after this sequence number.
        #[arg(long, default_value_t = 0)]
        after: u64,
    },
}

pub async fn handle(cmd: RunCommand) -> Result<()> {
    let ctx = Context::connect()?;
    match cmd {
        RunCommand::Tail { run_id, after } => {
            let run_id = RunId::from_string(&run_id);
            let events = ctx.run_log.read_after(&run_id, after, None).await?;
            if events.is_empty() {
                println!("no events after seq {after} for run {run_id}");
                return Ok(());
            }
            for record in &events {
                print!("{}", encode_frame(record)?);
            }
        }
    }
    Ok(())
}
