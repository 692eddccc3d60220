//! Both binaries load the same `edw_daemon::Config::from_env` (spec §6):
//! a required setting with no value present is a hard, clean failure —
//! never a panic — for either the CLI or the daemon process.

use crate::prelude::*;

#[test]
fn edw_status_fails_cleanly_without_required_config() {
    cli()
        .args(&["status"])
        .env_remove("S3_BUCKET")
        .env_remove("ENCRYPTION_KEY")
        .fails()
        .code(1);
}

#[test]
fn edwd_fails_cleanly_without_required_config() {
    daemon_bin().env_remove("S3_BUCKET").env_remove("ENCRYPTION_KEY").fails();
}

#[test]
fn edw_sandbox_show_requires_an_id_argument() {
    cli().args(&["sandbox", "show"]).fails().stderr_has("Usage:");
}

#[test]
fn edw_build_status_requires_a_run_id_argument() {
    cli().args(&["build", "status"]).fails().stderr_has("Usage:");
}
