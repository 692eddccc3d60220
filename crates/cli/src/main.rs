// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `edw` — operator CLI for inspecting and nudging sandbox state, run
//! event history, build status, and the job queue. There is no daemon IPC
//! surface to talk to (spec §1 keeps HTTP/SSE transport out of scope), so
//! every command here reads and writes the same `edw-storage`/`edw-engine`
//! primitives the daemon itself uses, rather than proxying through a
//! running process the way the teacher's `oj` CLI proxies through its
//! Unix-socket daemon client.

mod color;
mod commands;
mod context;
mod exit_error;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

#[derive(Parser)]
#[command(
    name = "edw",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Operator CLI for the odd jobs sandbox daemon",
    styles = color::styles()
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check connectivity to the KV store backing everything else.
    Status,
    #[command(subcommand)]
    Sandbox(commands::sandbox::SandboxCommand),
    #[command(subcommand)]
    Run(commands::run::RunCommand),
    #[command(subcommand)]
    Build(commands::build::BuildCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Status => commands::status::handle().await,
        Command::Sandbox(cmd) => commands::sandbox::handle(cmd).await,
        Command::Run(cmd) => commands::run::handle(cmd).await,
        Command::Build(cmd) => commands::build::handle(cmd).await,
    };

    if let Err(error) = result {
        match error.downcast::<ExitError>() {
            Ok(exit_error) => {
                eprintln!("{}", exit_error.message);
                std::process::exit(exit_error.code);
            }
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        }
    }
}
