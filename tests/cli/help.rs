//! `edw --help` surfaces every operator subcommand this rebuild actually
//! ships — status/sandbox/run/build, not the teacher's cron/decision/job/
//! queue/runbook/worker/workspace set.

use crate::prelude::*;

#[test]
fn edw_no_args_shows_usage() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn edw_help_lists_every_subcommand() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("sandbox")
        .stdout_has("run")
        .stdout_has("build");
}

#[test]
fn edw_sandbox_help_lists_its_subcommands() {
    cli()
        .args(&["sandbox", "--help"])
        .passes()
        .stdout_has("show")
        .stdout_has("active")
        .stdout_has("backup")
        .stdout_has("cleanup");
}

#[test]
fn edw_run_help_lists_tail() {
    cli().args(&["run", "--help"]).passes().stdout_has("tail");
}

#[test]
fn edw_build_help_lists_status() {
    cli().args(&["build", "--help"]).passes().stdout_has("status");
}
