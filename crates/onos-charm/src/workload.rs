//! Workload container control
//!
//! The ONOS container is driven through pebble. [`PebbleWorkload`] shells out
//! to the `pebble` CLI; [`MockWorkload`] keeps everything in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Command '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Command '{command}' timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Service '{0}' is not defined in the plan")]
    UnknownService(String),

    #[error("Path not found in workload: {0}")]
    PathNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorkloadError>;

/// Current state of a pebble service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
    Backoff,
    Error,
    Unknown,
}

impl ServiceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceStatus::Active)
    }
}

impl FromStr for ServiceStatus {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "active" => ServiceStatus::Active,
            "inactive" => ServiceStatus::Inactive,
            "backoff" => ServiceStatus::Backoff,
            "error" => ServiceStatus::Error,
            _ => ServiceStatus::Unknown,
        })
    }
}

/// Pebble layer, serialized in the format `pebble add` expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub summary: String,
    pub description: String,
    pub services: IndexMap<String, ServiceDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceDefinition {
    #[serde(rename = "override")]
    pub override_mode: String,
    pub summary: String,
    pub command: String,
    pub startup: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
}

#[async_trait]
pub trait Workload: Send + Sync {
    async fn service_status(&self, service: &str) -> Result<ServiceStatus>;

    async fn start(&self, service: &str) -> Result<()>;

    async fn stop(&self, service: &str) -> Result<()>;

    /// Add `layer` under `label`, merging with an existing layer of that label
    async fn add_layer(&self, label: &str, layer: &Layer) -> Result<()>;

    async fn push(&self, path: &Path, content: &str) -> Result<()>;

    /// Read a file, `None` when it does not exist
    async fn pull(&self, path: &Path) -> Result<Option<String>>;

    /// Names of the directories directly below `path`
    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>>;
}

/// Workload driven through the `pebble` command line client
pub struct PebbleWorkload {
    pebble_bin: String,
    socket: Option<PathBuf>,
    operation_timeout: Duration,
}

struct CommandOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl PebbleWorkload {
    pub fn new(pebble_bin: impl Into<String>, operation_timeout: Duration) -> Self {
        Self {
            pebble_bin: pebble_bin.into(),
            socket: None,
            operation_timeout,
        }
    }

    pub fn with_socket(mut self, socket: PathBuf) -> Self {
        self.socket = Some(socket);
        self
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let command = format!("{} {}", self.pebble_bin, args.join(" "));
        debug!("Running {}", command);

        let mut cmd = Command::new(&self.pebble_bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref socket) = self.socket {
            cmd.env("PEBBLE_SOCKET", socket);
        }

        let output = timeout(self.operation_timeout, cmd.output())
            .await
            .map_err(|_| WorkloadError::Timeout {
                command: command.clone(),
                seconds: self.operation_timeout.as_secs(),
            })?
            .map_err(|source| WorkloadError::Spawn {
                command: command.clone(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.success {
            return Err(WorkloadError::CommandFailed {
                command: format!("{} {}", self.pebble_bin, args.join(" ")),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Workload for PebbleWorkload {
    async fn service_status(&self, service: &str) -> Result<ServiceStatus> {
        let stdout = self.run_checked(&["services", service]).await?;
        parse_service_status(&stdout, service)
    }

    async fn start(&self, service: &str) -> Result<()> {
        info!("Starting service {}", service);
        self.run_checked(&["start", service]).await.map(|_| ())
    }

    async fn stop(&self, service: &str) -> Result<()> {
        info!("Stopping service {}", service);
        self.run_checked(&["stop", service]).await.map(|_| ())
    }

    async fn add_layer(&self, label: &str, layer: &Layer) -> Result<()> {
        // JSON is valid YAML, so the layer file needs no YAML writer
        let file = tempfile::Builder::new()
            .prefix("onos-layer-")
            .suffix(".yaml")
            .tempfile()?;
        std::fs::write(file.path(), serde_json::to_vec_pretty(layer)?)?;

        let path = file.path().to_string_lossy().to_string();
        self.run_checked(&["add", label, &path, "--combine"])
            .await
            .map(|_| ())
    }

    async fn push(&self, path: &Path, content: &str) -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), content)?;

        let local = file.path().to_string_lossy().to_string();
        let remote = path.to_string_lossy().to_string();
        self.run_checked(&["push", &local, &remote]).await.map(|_| ())
    }

    async fn pull(&self, path: &Path) -> Result<Option<String>> {
        let dir = tempfile::tempdir()?;
        let local = dir.path().join("pulled");
        let local_str = local.to_string_lossy().to_string();
        let remote = path.to_string_lossy().to_string();

        let output = self.run(&["pull", &remote, &local_str]).await?;
        if !output.success {
            if output.stderr.contains("no such file") || output.stderr.contains("not found") {
                return Ok(None);
            }
            return Err(WorkloadError::CommandFailed {
                command: format!("{} pull {}", self.pebble_bin, remote),
                stderr: output.stderr,
            });
        }

        Ok(Some(tokio::fs::read_to_string(&local).await?))
    }

    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        let remote = path.to_string_lossy().to_string();
        let stdout = self.run_checked(&["ls", "-l", &remote]).await?;
        Ok(parse_dir_listing(&stdout))
    }
}

/// Pick the `Current` column for `service` out of `pebble services` output
fn parse_service_status(output: &str, service: &str) -> Result<ServiceStatus> {
    output
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|columns| columns.first() == Some(&service))
        .and_then(|columns| columns.get(2).map(|current| current.parse()))
        .unwrap_or_else(|| Err(WorkloadError::UnknownService(service.to_string())))
}

/// Directory names out of `pebble ls -l` output
fn parse_dir_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.starts_with('d'))
        .filter_map(|line| line.split_whitespace().last())
        .map(|name| name.trim_end_matches('/'))
        .filter_map(|name| name.rsplit('/').next())
        .map(str::to_string)
        .collect()
}

/// Snapshot of what a [`MockWorkload`] has been asked to do
#[derive(Debug, Clone)]
pub struct MockWorkloadState {
    pub status: ServiceStatus,
    pub layers: Vec<(String, Layer)>,
    pub files: BTreeMap<PathBuf, String>,
    pub dirs: BTreeMap<PathBuf, Vec<String>>,
    pub starts: usize,
    pub stops: usize,
    pub pushes: usize,
}

impl Default for MockWorkloadState {
    fn default() -> Self {
        Self {
            status: ServiceStatus::Inactive,
            layers: Vec::new(),
            files: BTreeMap::new(),
            dirs: BTreeMap::new(),
            starts: 0,
            stops: 0,
            pushes: 0,
        }
    }
}

#[derive(Default)]
pub struct MockWorkload {
    state: Mutex<MockWorkloadState>,
}

impl MockWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock container with an ONOS install containing one Karaf release
    pub fn with_onos_install(root: &Path, karaf_dir: &str) -> Self {
        let workload = Self::new();
        if let Ok(mut state) = workload.state.lock() {
            state
                .dirs
                .insert(root.to_path_buf(), vec!["apps".to_string(), karaf_dir.to_string()]);
            state.files.insert(
                root.join(karaf_dir).join("etc/org.ops4j.pax.logging.cfg"),
                "log4j.rootLogger=INFO, rolling\n".to_string(),
            );
        }
        workload
    }

    pub fn set_status(&self, status: ServiceStatus) {
        if let Ok(mut state) = self.state.lock() {
            state.status = status;
        }
    }

    pub fn snapshot(&self) -> MockWorkloadState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockWorkloadState) -> T) -> Result<T> {
        let mut state = self.state.lock().map_err(|_| {
            WorkloadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock workload lock poisoned",
            ))
        })?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl Workload for MockWorkload {
    async fn service_status(&self, service: &str) -> Result<ServiceStatus> {
        let status = self.with_state(|state| {
            let defined = state
                .layers
                .iter()
                .any(|(_, layer)| layer.services.contains_key(service));
            defined.then_some(state.status)
        })?;
        status.ok_or_else(|| WorkloadError::UnknownService(service.to_string()))
    }

    async fn start(&self, _service: &str) -> Result<()> {
        self.with_state(|state| {
            state.status = ServiceStatus::Active;
            state.starts += 1;
        })
    }

    async fn stop(&self, _service: &str) -> Result<()> {
        self.with_state(|state| {
            state.status = ServiceStatus::Inactive;
            state.stops += 1;
        })
    }

    async fn add_layer(&self, label: &str, layer: &Layer) -> Result<()> {
        self.with_state(|state| {
            state.layers.push((label.to_string(), layer.clone()));
        })
    }

    async fn push(&self, path: &Path, content: &str) -> Result<()> {
        self.with_state(|state| {
            state.files.insert(path.to_path_buf(), content.to_string());
            state.pushes += 1;
        })
    }

    async fn pull(&self, path: &Path) -> Result<Option<String>> {
        self.with_state(|state| state.files.get(path).cloned())
    }

    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        self.with_state(|state| state.dirs.get(path).cloned())?
            .ok_or_else(|| WorkloadError::PathNotFound(path.display().to_string()))
    }
}
