// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container driver (C5, spec §4.4): one trait, a `bollard`-backed Docker
//! implementation, and a fake for tests — the teacher's `AgentAdapter`
//! trait-plus-fake split re-pointed at container lifecycle instead of
//! agent-process lifecycle.

use async_trait::async_trait;
use edw_core::{ChatId, Error, UserId};
use std::collections::HashMap;
use std::time::Duration;

pub const SANDBOX_MEMORY_BYTES: i64 = 1024 * 1024 * 1024;
pub const SANDBOX_PIDS_LIMIT: i64 = 100;
pub const SANDBOX_WORKDIR: &str = "/home/node/edward";
pub const SANDBOX_USER: &str = "node";
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(10);
pub const BUILD_EXEC_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MAX_CAPTURED_OUTPUT_BYTES: usize = 10 * 1024 * 1024;
const MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;
const TRUNCATION_MARKER: &str = "\n...[truncated]";

#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub timeout: Option<Duration>,
    pub user: Option<String>,
    pub workdir: Option<String>,
    pub env: Vec<(String, String)>,
    pub throw_on_error: bool,
}

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
}

/// One running or stopped container carrying the `sandbox=true` label,
/// as surfaced by [`ContainerDriver::list_sandbox_containers`] for the
/// reconciliation loop (spec §4.14 step 4).
#[derive(Debug, Clone)]
pub struct SandboxContainer {
    pub container_id: String,
    pub sandbox_id: String,
}

#[async_trait]
pub trait ContainerDriver: Send + Sync {
    async fn create(&self, user_id: &UserId, chat_id: &ChatId, sandbox_id: &str) -> Result<ContainerHandle, Error>;
    async fn ensure_running(&self, container: &ContainerHandle) -> Result<(), Error>;
    async fn exec(&self, container: &ContainerHandle, argv: &[String], options: ExecOptions) -> Result<ExecResult, Error>;
    async fn put_archive(&self, container: &ContainerHandle, tar_gz: Vec<u8>, path: &str) -> Result<(), Error>;
    /// Downloads `path` (file or directory) as a gzip-compressed tar
    /// archive, the inverse of [`ContainerDriver::put_archive`]. Used by
    /// the build pipeline (§4.12) to pull a build's output directory out
    /// of the sandbox for upload.
    async fn get_archive(&self, container: &ContainerHandle, path: &str) -> Result<Vec<u8>, Error>;
    async fn list_files(&self, container: &ContainerHandle) -> Result<Vec<FileEntry>, Error>;
    async fn destroy(&self, container_id: &str) -> Result<(), Error>;
    async fn is_running(&self, container_id: &str) -> Result<bool, Error>;
    /// Lists every container labelled `sandbox=true`, regardless of run
    /// state, with its `sandboxId` label. Backs the reconciliation sweep
    /// (spec §4.14 step 4) that destroys containers with no live state
    /// record.
    async fn list_sandbox_containers(&self) -> Result<Vec<SandboxContainer>, Error>;
}

pub struct BollardContainerDriver {
    docker: bollard::Docker,
}

impl BollardContainerDriver {
    pub fn connect() -> Result<Self, Error> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| Error::Internal(format!("docker connect failed: {e}")))?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerDriver for BollardContainerDriver {
    async fn create(&self, user_id: &UserId, chat_id: &ChatId, sandbox_id: &str) -> Result<ContainerHandle, Error> {
        use bollard::container::Config;
        use bollard::models::{HostConfig, PortBinding};

        let mut labels = HashMap::new();
        labels.insert("sandbox".to_string(), "true".to_string());
        labels.insert("user".to_string(), user_id.as_str().to_string());
        labels.insert("chat".to_string(), chat_id.as_str().to_string());
        labels.insert("sandboxId".to_string(), sandbox_id.to_string());

        let host_config = HostConfig {
            memory: Some(SANDBOX_MEMORY_BYTES),
            pids_limit: Some(SANDBOX_PIDS_LIMIT),
            network_mode: Some("none".to_string()),
            port_bindings: Some(HashMap::<String, Option<Vec<PortBinding>>>::new()),
            ..Default::default()
        };

        let config = Config {
            image: Some("edward-sandbox:latest".to_string()),
            user: Some(SANDBOX_USER.to_string()),
            working_dir: Some(SANDBOX_WORKDIR.to_string()),
            cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            labels: Some(labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let name = format!("edward-sandbox-{sandbox_id}");
        let created = self
            .docker
            .create_container(Some(bollard::container::CreateContainerOptions { name: name.clone(), platform: None }), config)
            .await
            .map_err(|e| Error::Internal(format!("create_container failed: {e}")))?;

        self.docker
            .start_container::<String>(&created.id, None)
            .await
            .map_err(|e| Error::Internal(format!("start_container failed: {e}")))?;

        let handle = ContainerHandle { id: created.id };
        self.exec(
            &handle,
            &["mkdir".to_string(), "-p".to_string(), SANDBOX_WORKDIR.to_string()],
            ExecOptions { throw_on_error: true, ..Default::default() },
        )
        .await?;
        self.exec(
            &handle,
            &["chmod".to_string(), "755".to_string(), SANDBOX_WORKDIR.to_string()],
            ExecOptions { throw_on_error: true, ..Default::default() },
        )
        .await?;
        Ok(handle)
    }

    async fn ensure_running(&self, container: &ContainerHandle) -> Result<(), Error> {
        let info = self
            .docker
            .inspect_container(&container.id, None)
            .await
            .map_err(|e| Error::Internal(format!("inspect_container failed: {e}")))?;
        let state = info.state.unwrap_or_default();
        if state.paused.unwrap_or(false) {
            self.docker
                .unpause_container(&container.id)
                .await
                .map_err(|e| Error::Internal(format!("unpause_container failed: {e}")))?;
        } else if !state.running.unwrap_or(false) {
            self.docker
                .start_container::<String>(&container.id, None)
                .await
                .map_err(|e| Error::Internal(format!("start_container failed: {e}")))?;
        }
        Ok(())
    }

    async fn exec(&self, container: &ContainerHandle, argv: &[String], options: ExecOptions) -> Result<ExecResult, Error> {
        use bollard::exec::{CreateExecOptions, StartExecResults};
        use futures_util::StreamExt;

        let exec_config = CreateExecOptions {
            cmd: Some(argv.to_vec()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            user: options.user.clone(),
            working_dir: options.workdir.clone().or_else(|| Some(SANDBOX_WORKDIR.to_string())),
            env: Some(options.env.iter().map(|(k, v)| format!("{k}={v}")).collect()),
            ..Default::default()
        };

        let created = self
            .docker
            .create_exec(&container.id, exec_config)
            .await
            .map_err(|e| Error::Internal(format!("create_exec failed: {e}")))?;

        let timeout = options.timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT);
        let run = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let StartExecResults::Attached { mut output, .. } = self
                .docker
                .start_exec(&created.id, None)
                .await
                .map_err(|e| Error::Internal(format!("start_exec failed: {e}")))?
            {
                while let Some(chunk) = output.next().await {
                    match chunk.map_err(|e| Error::Internal(e.to_string()))? {
                        bollard::container::LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                        bollard::container::LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                        _ => {}
                    }
                }
            }
            Ok::<_, Error>((stdout, stderr))
        };

        let (stdout, stderr) = tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| Error::CommandFailed(format!("exec timed out after {timeout:?}")))??;

        let inspected = self
            .docker
            .inspect_exec(&created.id)
            .await
            .map_err(|e| Error::Internal(format!("inspect_exec failed: {e}")))?;
        let exit_code = inspected.exit_code.unwrap_or(-1) as i32;

        let result = ExecResult {
            exit_code,
            stdout: truncate_capture(&stdout),
            stderr: truncate_capture(&stderr),
        };
        if options.throw_on_error && result.exit_code != 0 {
            return Err(Error::CommandFailed(format!(
                "{} exited {}: {}",
                argv.first().cloned().unwrap_or_default(),
                result.exit_code,
                result.stderr
            )));
        }
        Ok(result)
    }

    async fn put_archive(&self, container: &ContainerHandle, tar_gz: Vec<u8>, path: &str) -> Result<(), Error> {
        use bollard::container::UploadToContainerOptions;
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(tar_gz.as_slice());
        let mut tar_bytes = Vec::new();
        decoder.read_to_end(&mut tar_bytes).map_err(|e| Error::Internal(format!("gunzip failed: {e}")))?;

        self.docker
            .upload_to_container(&container.id, Some(UploadToContainerOptions { path: path.to_string(), ..Default::default() }), tar_bytes.into())
            .await
            .map_err(|e| Error::Internal(format!("upload_to_container failed: {e}")))
    }

    async fn get_archive(&self, container: &ContainerHandle, path: &str) -> Result<Vec<u8>, Error> {
        use bollard::container::DownloadFromContainerOptions;
        use futures_util::StreamExt;
        use std::io::Write;

        let mut stream = self.docker.download_from_container(&container.id, Some(DownloadFromContainerOptions { path: path.to_string() }));
        let mut tar_bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            tar_bytes.extend_from_slice(&chunk.map_err(|e| Error::Internal(format!("download_from_container failed: {e}")))?);
        }

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar_bytes).map_err(|e| Error::Internal(format!("gzip encode failed: {e}")))?;
        encoder.finish().map_err(|e| Error::Internal(format!("gzip finish failed: {e}")))
    }

    async fn list_files(&self, container: &ContainerHandle) -> Result<Vec<FileEntry>, Error> {
        let result = self
            .exec(
                container,
                &["find".to_string(), ".".to_string(), "-type".to_string(), "f".to_string(), "-printf".to_string(), "%s %p\\n".to_string()],
                ExecOptions { throw_on_error: true, ..Default::default() },
            )
            .await?;
        let mut files = Vec::new();
        for line in result.stdout.lines() {
            if let Some((size, path)) = line.split_once(' ') {
                if let Ok(size) = size.parse::<u64>() {
                    if size <= MAX_FILE_SIZE_BYTES {
                        files.push(FileEntry { path: path.to_string(), size });
                    }
                }
            }
        }
        Ok(files)
    }

    async fn destroy(&self, container_id: &str) -> Result<(), Error> {
        use bollard::container::RemoveContainerOptions;
        match self
            .docker
            .remove_container(container_id, Some(RemoveContainerOptions { force: true, ..Default::default() }))
            .await
        {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => Ok(()),
            Err(e) => Err(Error::Internal(format!("remove_container failed: {e}"))),
        }
    }

    async fn is_running(&self, container_id: &str) -> Result<bool, Error> {
        match self.docker.inspect_container(container_id, None).await {
            Ok(info) => Ok(info.state.and_then(|s| s.running).unwrap_or(false)),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => Ok(false),
            Err(e) => Err(Error::Internal(format!("inspect_container failed: {e}"))),
        }
    }

    async fn list_sandbox_containers(&self) -> Result<Vec<SandboxContainer>, Error> {
        use bollard::container::ListContainersOptions;

        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec!["sandbox=true".to_string()]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions { all: true, filters, ..Default::default() }))
            .await
            .map_err(|e| Error::Internal(format!("list_containers failed: {e}")))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let container_id = c.id?;
                let sandbox_id = c.labels.unwrap_or_default().get("sandboxId")?.clone();
                Some(SandboxContainer { container_id, sandbox_id })
            })
            .collect())
    }
}

fn truncate_capture(bytes: &[u8]) -> String {
    let s = String::from_utf8_lossy(bytes);
    if s.len() <= MAX_CAPTURED_OUTPUT_BYTES {
        return s.into_owned();
    }
    let mut end = MAX_CAPTURED_OUTPUT_BYTES.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &s[..end])
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap as StdHashMap;

    #[derive(Default)]
    pub struct FakeContainerDriver {
        pub running: Mutex<StdHashMap<String, bool>>,
        pub sandbox_ids: Mutex<StdHashMap<String, String>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeContainerDriver {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ContainerDriver for FakeContainerDriver {
        async fn create(&self, _user_id: &UserId, _chat_id: &ChatId, sandbox_id: &str) -> Result<ContainerHandle, Error> {
            let id = format!("container-{sandbox_id}");
            self.running.lock().insert(id.clone(), true);
            self.sandbox_ids.lock().insert(id.clone(), sandbox_id.to_string());
            self.calls.lock().push(format!("create:{id}"));
            Ok(ContainerHandle { id })
        }

        async fn ensure_running(&self, container: &ContainerHandle) -> Result<(), Error> {
            self.running.lock().insert(container.id.clone(), true);
            Ok(())
        }

        async fn exec(&self, container: &ContainerHandle, argv: &[String], options: ExecOptions) -> Result<ExecResult, Error> {
            self.calls.lock().push(format!("exec:{}:{}", container.id, argv.join(" ")));
            if options.throw_on_error && argv.first().map(String::as_str) == Some("false") {
                return Err(Error::CommandFailed("simulated failure".to_string()));
            }
            Ok(ExecResult { exit_code: 0, stdout: String::new(), stderr: String::new() })
        }

        async fn put_archive(&self, container: &ContainerHandle, _tar_gz: Vec<u8>, path: &str) -> Result<(), Error> {
            self.calls.lock().push(format!("put_archive:{}:{path}", container.id));
            Ok(())
        }

        async fn get_archive(&self, container: &ContainerHandle, path: &str) -> Result<Vec<u8>, Error> {
            self.calls.lock().push(format!("get_archive:{}:{path}", container.id));
            // A real driver always returns a valid gzip-tar; match that
            // shape here instead of an empty Vec so callers that parse the
            // result (e.g. backup) don't need driver-specific fake handling.
            crate::backup::build_tar_gz(&[])
        }

        async fn list_files(&self, _container: &ContainerHandle) -> Result<Vec<FileEntry>, Error> {
            Ok(Vec::new())
        }

        async fn destroy(&self, container_id: &str) -> Result<(), Error> {
            self.running.lock().remove(container_id);
            Ok(())
        }

        async fn is_running(&self, container_id: &str) -> Result<bool, Error> {
            Ok(self.running.lock().get(container_id).copied().unwrap_or(false))
        }

        async fn list_sandbox_containers(&self) -> Result<Vec<SandboxContainer>, Error> {
            Ok(self
                .sandbox_ids
                .lock()
                .iter()
                .map(|(container_id, sandbox_id)| SandboxContainer { container_id: container_id.clone(), sandbox_id: sandbox_id.clone() })
                .collect())
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
