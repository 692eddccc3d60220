// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build pipeline (C13, spec §4.12): detect a project's package manager,
//! run its build script inside the sandbox, locate the output directory,
//! ship it to preview storage and publish a `build_status` event on the
//! run's event log.

use edw_container::{ContainerDriver, ContainerHandle, ExecOptions};
use edw_core::build::{BuildId, BuildStatus};
use edw_core::sandbox::{ChatId, UserId};
use edw_core::{Error, RunId};
use edw_storage::RunEventLog;
use edw_wire::StreamEvent;

use crate::preview::{route_preview, DeploymentMode, EdgeKvClient, PreviewConfig};
use edw_container::ObjectStore;

const PACKAGE_MANAGER_LOCKFILES: &[(&str, PackageManager)] =
    &[("pnpm-lock.yaml", PackageManager::Pnpm), ("yarn.lock", PackageManager::Yarn), ("package-lock.json", PackageManager::Npm)];
const OUTPUT_DIR_CANDIDATES: &[&str] = &["dist", "build", ".next/standalone", "out", ".output"];
const ERROR_TAIL_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Yarn,
    Npm,
}

impl PackageManager {
    pub fn run_build_argv(self) -> Vec<String> {
        let (cmd, args): (&str, &[&str]) = match self {
            PackageManager::Pnpm => ("pnpm", &["run", "build"]),
            PackageManager::Yarn => ("yarn", &["run", "build"]),
            PackageManager::Npm => ("npm", &["run", "build"]),
        };
        std::iter::once(cmd.to_string()).chain(args.iter().map(|a| a.to_string())).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub status: BuildStatus,
    pub preview_url: Option<String>,
    pub error_log: Option<String>,
}

/// Request for one build run. `run_id` is the event log this pipeline
/// publishes `BuildStatus` to — `JobPayload::Build` already carries one, so
/// there is no need for a second `chatId`-keyed pub/sub channel.
pub struct BuildRequest {
    pub build_id: BuildId,
    pub run_id: RunId,
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub container: ContainerHandle,
    pub workdir: String,
    pub deployment_mode: DeploymentMode,
}

pub struct BuildPipeline {
    container: std::sync::Arc<dyn ContainerDriver>,
    object_store: std::sync::Arc<dyn ObjectStore>,
    edge_kv: std::sync::Arc<dyn EdgeKvClient>,
    run_log: std::sync::Arc<RunEventLog>,
    preview_config: PreviewConfig,
}

impl BuildPipeline {
    pub fn new(
        container: std::sync::Arc<dyn ContainerDriver>,
        object_store: std::sync::Arc<dyn ObjectStore>,
        edge_kv: std::sync::Arc<dyn EdgeKvClient>,
        run_log: std::sync::Arc<RunEventLog>,
        preview_config: PreviewConfig,
    ) -> Self {
        Self { container, object_store, edge_kv, run_log, preview_config }
    }

    pub async fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, Error> {
        self.publish(request, BuildStatus::Building, None, None).await?;

        let outcome = self.run_inner(request).await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => BuildOutcome { status: BuildStatus::Failed, preview_url: None, error_log: Some(e.to_string()) },
        };

        self.publish(request, outcome.status, outcome.preview_url.clone(), outcome.error_log.clone()).await?;
        Ok(outcome)
    }

    async fn run_inner(&self, request: &BuildRequest) -> Result<BuildOutcome, Error> {
        let manager = self.detect_package_manager(request).await?;
        if manager.is_none() || !self.has_build_script(request).await? {
            let output_dir = self.detect_output_dir(request).await?;
            let preview_url = self.publish_output(request, &output_dir).await?;
            return Ok(BuildOutcome { status: BuildStatus::Success, preview_url: Some(preview_url), error_log: None });
        }
        let manager = manager.expect("checked above");

        let base_path = base_path_for(request.deployment_mode, &request.user_id, &request.chat_id);
        let env = vec![
            ("NEXT_TELEMETRY_DISABLED".to_string(), "1".to_string()),
            ("CI".to_string(), "true".to_string()),
            ("EDWARD_BASE_PATH".to_string(), base_path),
        ];

        let result = self
            .container
            .exec(
                &request.container,
                &manager.run_build_argv(),
                ExecOptions { workdir: Some(request.workdir.clone()), env, timeout: Some(edw_container::driver::BUILD_EXEC_TIMEOUT), ..Default::default() },
            )
            .await?;

        if result.exit_code != 0 {
            let tail = tail_chars(&format!("{}\n{}", result.stdout, result.stderr), ERROR_TAIL_CHARS);
            return Err(Error::BuildFailed(tail));
        }

        let output_dir = self.detect_output_dir(request).await?;
        let preview_url = self.publish_output(request, &output_dir).await?;
        Ok(BuildOutcome { status: BuildStatus::Success, preview_url: Some(preview_url), error_log: None })
    }

    async fn detect_package_manager(&self, request: &BuildRequest) -> Result<Option<PackageManager>, Error> {
        for (lockfile, manager) in PACKAGE_MANAGER_LOCKFILES {
            if self.file_exists(request, lockfile).await? {
                return Ok(Some(*manager));
            }
        }
        if self.file_exists(request, "package.json").await? {
            return Ok(Some(PackageManager::Npm));
        }
        Ok(None)
    }

    async fn has_build_script(&self, request: &BuildRequest) -> Result<bool, Error> {
        let result = self
            .container
            .exec(&request.container, &["cat".to_string(), "package.json".to_string()], ExecOptions { workdir: Some(request.workdir.clone()), ..Default::default() })
            .await?;
        if result.exit_code != 0 {
            return Ok(false);
        }
        let manifest: serde_json::Value = match serde_json::from_str(&result.stdout) {
            Ok(value) => value,
            Err(_) => return Ok(false),
        };
        Ok(manifest.get("scripts").and_then(|s| s.get("build")).and_then(|b| b.as_str()).is_some())
    }

    async fn file_exists(&self, request: &BuildRequest, name: &str) -> Result<bool, Error> {
        let result = self
            .container
            .exec(&request.container, &["test".to_string(), "-f".to_string(), name.to_string()], ExecOptions { workdir: Some(request.workdir.clone()), ..Default::default() })
            .await?;
        Ok(result.exit_code == 0)
    }

    /// Probes `dist, build, .next/standalone, out, .output`, falling back
    /// to `.` when `index.html` is already at the workspace root (§4.12
    /// step 5).
    async fn detect_output_dir(&self, request: &BuildRequest) -> Result<String, Error> {
        for candidate in OUTPUT_DIR_CANDIDATES {
            if self.file_exists(request, &format!("{candidate}/index.html")).await? {
                return Ok((*candidate).to_string());
            }
        }
        Ok(".".to_string())
    }

    async fn publish_output(&self, request: &BuildRequest, output_dir: &str) -> Result<String, Error> {
        let full_path = format!("{}/{}", request.workdir.trim_end_matches('/'), output_dir.trim_start_matches("./"));
        let archive = self.container.get_archive(&request.container, &full_path).await?;

        let prefix = format!("{}/{}/preview", request.user_id.as_str(), request.chat_id.as_str());
        let key = format!("{prefix}/output.tar.gz");
        self.object_store.put_object(&key, archive, "application/gzip").await?;
        self.object_store.invalidate_prefix(&prefix).await?;

        route_preview(self.edge_kv.as_ref(), &self.preview_config, &request.user_id, &request.chat_id).await
    }

    async fn publish(&self, request: &BuildRequest, status: BuildStatus, preview_url: Option<String>, error_log: Option<String>) -> Result<(), Error> {
        self.run_log
            .append(
                &request.run_id,
                StreamEvent::BuildStatus { chat_id: request.chat_id.as_str().to_string(), status, build_id: request.build_id.clone(), preview_url, error_log },
            )
            .await?;
        Ok(())
    }
}

/// `basePath = deploymentType == "path" ? "/<user>/<chat>/preview" : ""`
/// (§4.12 step 3). Framework-specific config-file patching (`next.config`,
/// `vite.config`) is out of scope here — only the env var is injected.
fn base_path_for(mode: DeploymentMode, user_id: &UserId, chat_id: &ChatId) -> String {
    match mode {
        DeploymentMode::Path => format!("/{}/{}/preview", user_id.as_str(), chat_id.as_str()),
        DeploymentMode::Subdomain => String::new(),
    }
}

fn tail_chars(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max {
        return s.to_string();
    }
    chars[chars.len() - max..].iter().collect()
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
