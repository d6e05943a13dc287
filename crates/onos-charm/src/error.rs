//! Error types for charm operations

use onos_client::OnosApiError;
use onos_event_bus::EventBusError;
use onos_shared_types::{ActionError, ConfigError};
use thiserror::Error;

use crate::host::HostError;
use crate::relation::RelationError;
use crate::settings::SettingsError;
use crate::state::StateError;
use crate::workload::WorkloadError;

/// Main error type for the charm
#[derive(Debug, Error)]
pub enum CharmError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(#[from] ConfigError),

    /// ONOS answered with a non-success status; the body is passed through
    #[error("Remote operation failed with status {status}: {body}")]
    RemoteOperationFailed { status: u16, body: String },

    #[error("ONOS API error: {0}")]
    Api(OnosApiError),

    #[error("{0}")]
    ServiceState(String),

    #[error("Workload error: {0}")]
    Workload(#[from] WorkloadError),

    #[error("Relation error: {0}")]
    Relation(#[from] RelationError),

    #[error("Hook tool error: {0}")]
    Host(#[from] HostError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),
}

impl From<OnosApiError> for CharmError {
    fn from(err: OnosApiError) -> Self {
        match err {
            OnosApiError::RemoteOperationFailed { status, body } => {
                CharmError::RemoteOperationFailed { status, body }
            }
            other => CharmError::Api(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CharmError>;
