//! Charm state persisted between events

use std::path::Path;

use chrono::{DateTime, Utc};
use onos_shared_types::{IngressData, UnitStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::WorkloadSpec;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharmState {
    /// The workload container reported pebble-ready
    pub ready: bool,
    /// The ONOS service has been started at least once
    pub started: bool,
    /// Workload definition last pushed into the container
    pub applied_workload: Option<WorkloadSpec>,
    /// Ingress data last published, `None` when nothing is published
    pub applied_ingress: Option<IngressData>,
    pub status: UnitStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CharmState {
    /// Load the state file; a missing file yields the initial state
    pub async fn load(path: &Path) -> Result<Self, StateError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(StateError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }

    /// Replace the state file atomically. The file holds rendered
    /// credentials, so it is only readable by its owner.
    pub async fn save(&self, path: &Path) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let content = serde_json::to_vec_pretty(self).map_err(|source| StateError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_err)?;
        set_owner_only(&tmp).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
async fn set_owner_only(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn set_owner_only(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
