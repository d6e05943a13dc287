//! Juju hook tools
//!
//! Thin async wrappers around the commands Juju puts on the PATH of a
//! running hook or action (`config-get`, `relation-set`, `status-set`, ...).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use onos_shared_types::UnitStatus;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to run hook tool '{tool}': {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("Hook tool '{tool}' failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error("Hook tool '{tool}' timed out")]
    Timeout { tool: String },

    #[error("Unexpected output from '{tool}': {message}")]
    Parse { tool: String, message: String },
}

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Clone)]
pub struct HookTools {
    tools_dir: Option<PathBuf>,
    timeout: Duration,
}

impl HookTools {
    pub fn new(tools_dir: Option<PathBuf>, timeout: Duration) -> Self {
        Self { tools_dir, timeout }
    }

    fn program(&self, tool: &str) -> PathBuf {
        match self.tools_dir {
            Some(ref dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    async fn run(&self, tool: &str, args: &[String]) -> Result<String> {
        debug!("Running hook tool {} ({} argument(s))", tool, args.len());

        let mut cmd = Command::new(self.program(tool));
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| HostError::Timeout {
                tool: tool.to_string(),
            })?
            .map_err(|source| HostError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(HostError::ToolFailed {
                tool: tool.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn parse_json<T: serde::de::DeserializeOwned>(tool: &str, output: &str) -> Result<T> {
        serde_json::from_str(output.trim()).map_err(|e| HostError::Parse {
            tool: tool.to_string(),
            message: e.to_string(),
        })
    }

    /// Raw `config-get --format=json` document
    pub async fn config_get(&self) -> Result<String> {
        self.run("config-get", &["--format=json".to_string()]).await
    }

    pub async fn is_leader(&self) -> Result<bool> {
        let output = self.run("is-leader", &["--format=json".to_string()]).await?;
        Self::parse_json("is-leader", &output)
    }

    pub async fn relation_ids(&self, endpoint: &str) -> Result<Vec<String>> {
        let output = self
            .run(
                "relation-ids",
                &["--format=json".to_string(), endpoint.to_string()],
            )
            .await?;
        Self::parse_json("relation-ids", &output)
    }

    /// Set application (`app = true`) or unit data on one relation.
    /// An empty value removes the key.
    pub async fn relation_set(
        &self,
        relation_id: &str,
        fields: &[(String, String)],
        app: bool,
    ) -> Result<()> {
        let mut args = vec!["-r".to_string(), relation_id.to_string()];
        if app {
            args.push("--app".to_string());
        }
        args.extend(fields.iter().map(|(key, value)| format!("{}={}", key, value)));
        self.run("relation-set", &args).await.map(|_| ())
    }

    pub async fn status_set(&self, status: &UnitStatus) -> Result<()> {
        let mut args = vec![status.name().to_string()];
        if !status.message().is_empty() {
            args.push(status.message().to_string());
        }
        self.run("status-set", &args).await.map(|_| ())
    }

    pub async fn action_set(&self, results: &BTreeMap<String, String>) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }
        let args: Vec<String> = results
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        self.run("action-set", &args).await.map(|_| ())
    }

    pub async fn action_fail(&self, message: &str) -> Result<()> {
        self.run("action-fail", &[message.to_string()]).await.map(|_| ())
    }
}
