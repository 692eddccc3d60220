// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status command: confirms the CLI can reach the same KV store the daemon
//! runs on, and surfaces the dead-letter count as a coarse health signal.

use anyhow::Result;

use crate::context::Context;

pub async fn handle() -> Result<()> {
    let ctx = Context::connect()?;
    let dead_letters = ctx.queue.dead_letters().await?;

    println!("{}", crate::color::header("edw daemon storage"));
    println!("  reachable: yes");
    println!("  dead-letter jobs: {}", dead_letters.len());
    for item in dead_letters.iter().take(10) {
        println!("    {} ({})", crate::color::literal(item.job_id.as_str()), item.payload.kind());
    }
    if dead_letters.len() > 10 {
        println!("    ... and {} more", dead_letters.len() - 10);
    }

    Ok(())
}
