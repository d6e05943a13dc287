//! ONOS operator charm
//!
//! Two request/response layers sit on top of the workload container:
//! the action dispatcher, which maps host actions onto the ONOS REST API or
//! onto service signals, and the configuration reconciler, which turns the
//! charm options into a pebble layer, Karaf files and ingress data.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod host;
pub mod lifecycle;
pub mod plan;
pub mod reconciler;
pub mod relation;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
pub mod workload;

mod tests;

pub use context::CharmContext;
pub use dispatcher::{dispatch, ActionOutcome};
pub use error::{CharmError, Result};
pub use hooks::{CharmEventLogger, HostStatusReporter};
pub use host::{HookTools, HostError};
pub use lifecycle::{on_config_changed, on_invalid_config, on_pebble_ready, set_status};
pub use plan::{DerivedState, WorkloadSpec};
pub use reconciler::{reconcile, ReconcileOutcome};
pub use relation::{FileRelationStore, HookToolRelationStore, MockRelationStore, RelationStore};
pub use routes::{operation_for, Operation, ServiceSignal};
pub use settings::{CharmSettings, RelationBackend, SettingsError};
pub use state::{CharmState, StateError};
pub use workload::{MockWorkload, PebbleWorkload, ServiceStatus, Workload, WorkloadError};
