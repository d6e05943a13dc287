//! Where the charm options come from

use std::path::PathBuf;

use anyhow::{Context, Result};
use onos_charm::HookTools;
use onos_shared_types::{CharmConfig, ConfigError};

pub enum ConfigSource {
    /// A JSON document in the `config-get --format=json` layout
    File(PathBuf),
    /// `config-get` of the running unit
    HookTools(HookTools),
}

impl ConfigSource {
    pub async fn read(&self) -> Result<String> {
        match self {
            ConfigSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read charm config {}", path.display())),
            ConfigSource::HookTools(tools) => tools
                .config_get()
                .await
                .context("Failed to read charm config with config-get"),
        }
    }

    /// Read and parse the options. The outer error means the document could
    /// not be read at all, the inner one that its content is unusable.
    pub async fn load(&self) -> Result<std::result::Result<CharmConfig, ConfigError>> {
        let document = self.read().await?;
        Ok(CharmConfig::from_json_str(&document))
    }
}
