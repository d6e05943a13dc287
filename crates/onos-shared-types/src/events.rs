use serde::{Deserialize, Serialize};

use crate::action::ActionName;
use crate::status::UnitStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CharmEvent {
    /// Reconciler pushed a new workload definition
    ConfigApplied { changes: Vec<ConfigChange> },
    /// The ONOS service was (re)started
    WorkloadRestarted { service: String },
    /// Ingress relation data was rewritten; `None` means it was cleared
    IngressUpdated { hostname: Option<String> },
    /// An action finished, successfully or not
    ActionCompleted { action: ActionName, success: bool },
    /// Unit status changed
    StatusChanged { status: UnitStatus },
}

/// Part of the derived workload state that changed during a reconcile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConfigChange {
    Environment,
    ManagedFiles,
    Ingress,
}
