use std::fmt;

use serde::{Deserialize, Serialize};

/// Workload status reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    #[default]
    Unknown,
    Active,
    Maintenance(String),
    Waiting(String),
    Blocked(String),
}

impl UnitStatus {
    /// Status name as accepted by `status-set`
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Unknown => "unknown",
            UnitStatus::Active => "active",
            UnitStatus::Maintenance(_) => "maintenance",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Blocked(_) => "blocked",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Unknown | UnitStatus::Active => "",
            UnitStatus::Maintenance(message)
            | UnitStatus::Waiting(message)
            | UnitStatus::Blocked(message) => message,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            f.write_str(self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}
