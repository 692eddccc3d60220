// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox inspection and lifecycle nudges (spec §4.3, §4.7, §4.14).
//! Cleanup and backup are enqueued onto the same job queue the daemon's
//! worker pool drains — the CLI never touches the container driver
//! directly for these, so an operator-triggered backup or cleanup gets
//! the same retry policy as an automatic one.

use anyhow::Result;
use clap::Subcommand;
use edw_core::{ChatId, JobPayload, JobReason, SandboxId, UserId};

use crate::context::Context;
use crate::exit_error::ExitError;

#[derive(Subcommand)]
pub enum SandboxCommand {
    /// Show the stored record for a sandbox ID.
    Show { sandbox_id: String },
    /// Show the active sandbox for a chat, if its container is still alive.
    Active { chat_id: String },
    /// Enqueue a backup of the sandbox's workspace.
    Backup {
        sandbox_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        chat_id: String,
    },
    /// Enqueue destruction of the sandbox's container and its state record.
    Cleanup {
        sandbox_id: String,
        #[arg(long)]
        user_id: String,
    },
}

pub async fn handle(cmd: SandboxCommand) -> Result<()> {
    let ctx = Context::connect()?;
    match cmd {
        SandboxCommand::Show { sandbox_id } => {
            let id = SandboxId::from_string(&sandbox_id);
            match ctx.sandbox_store.get(&id).await? {
                Some(sandbox) => println!("{}", serde_json::to_string_pretty(&sandbox)?),
                None => return Err(ExitError::new(1, format!("no sandbox record for {sandbox_id}")).into()),
            }
        }
        SandboxCommand::Active { chat_id } => {
            let chat_id = ChatId::new(chat_id.clone());
            match ctx.sandbox_store.get_active(&chat_id).await? {
                Some(sandbox) => println!("{}", serde_json::to_string_pretty(&sandbox)?),
                None => println!("no active sandbox for chat {chat_id}"),
            }
        }
        SandboxCommand::Backup { sandbox_id, user_id, chat_id } => {
            let payload = JobPayload::Backup {
                sandbox_id: SandboxId::from_string(&sandbox_id),
                user_id: UserId::new(user_id),
                chat_id: ChatId::new(chat_id),
                reason: JobReason::UserRequested,
            };
            match ctx.queue.enqueue(payload, "manual").await? {
                Some(job_id) => println!("enqueued {job_id}"),
                None => println!("a backup for this sandbox is already queued"),
            }
        }
        SandboxCommand::Cleanup { sandbox_id, user_id } => {
            let payload = JobPayload::Cleanup {
                sandbox_id: SandboxId::from_string(&sandbox_id),
                user_id: UserId::new(user_id),
                reason: JobReason::UserRequested,
            };
            match ctx.queue.enqueue(payload, "manual").await? {
                Some(job_id) => println!("enqueued {job_id}"),
                None => println!("a cleanup for this sandbox is already queued"),
            }
        }
    }
    Ok(())
}
