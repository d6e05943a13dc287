//! Runtime settings of the operator process
//!
//! These are not Juju options: they describe where ONOS, pebble and the
//! state file live. Loaded from an optional TOML file with `ONOS_CHARM_*`
//! environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use onos_shared_types::onos::{ROOT_FOLDER, WEB_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "ONOS_CHARM";
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/onos-charm/settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to render settings: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where relation data is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationBackend {
    /// `relation-set` and friends, the normal mode under Juju
    HookTools,
    /// A JSON file, for running outside of a unit
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharmSettings {
    /// Juju application name, advertised as the ingress service name
    pub app_name: String,

    pub api_base_url: String,
    /// HTTP timeout for ONOS API calls, in seconds
    pub api_timeout: u64,

    /// ONOS install location inside the workload container
    pub onos_root: PathBuf,

    pub pebble_bin: String,
    pub pebble_socket: Option<PathBuf>,
    /// Timeout for pebble and hook tool invocations, in seconds
    pub command_timeout: u64,

    pub state_file: PathBuf,

    pub relation_backend: RelationBackend,
    pub relation_file: PathBuf,

    /// Mirror statuses and action results through the hook tools
    pub report_to_host: bool,
    /// Directory holding the hook tools, when they are not on PATH
    pub hook_tools_dir: Option<PathBuf>,
}

impl Default for CharmSettings {
    fn default() -> Self {
        Self {
            app_name: "onos".to_string(),
            api_base_url: format!("http://localhost:{}", WEB_PORT),
            api_timeout: 30,
            onos_root: PathBuf::from(ROOT_FOLDER),
            pebble_bin: "pebble".to_string(),
            pebble_socket: None,
            command_timeout: 60,
            state_file: PathBuf::from(".onos-charm/state.json"),
            relation_backend: RelationBackend::HookTools,
            relation_file: PathBuf::from(".onos-charm/relations.json"),
            report_to_host: true,
            hook_tools_dir: None,
        }
    }
}

impl CharmSettings {
    /// Load settings from `path` (if it exists) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(false),
            );
        }

        let settings: CharmSettings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.app_name.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "app_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api_timeout == 0 || self.command_timeout == 0 {
            return Err(SettingsError::Invalid {
                field: "timeout",
                reason: "timeouts must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}
