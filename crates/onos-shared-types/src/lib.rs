pub mod action;
pub mod config;
pub mod error;
pub mod events;
pub mod ingress;
pub mod onos;
pub mod status;

pub use action::{
    catalog, Action, ActionDescriptor, ActionError, ActionInvocation, ActionName, ParamSpec, Role,
};
pub use config::{CharmConfig, ConfigError};
pub use error::SharedTypeError;
pub use events::{CharmEvent, ConfigChange};
pub use ingress::IngressData;
pub use status::UnitStatus;
