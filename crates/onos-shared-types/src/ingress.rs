//! Data published on the `ingress` relation

use serde::{Deserialize, Serialize};

pub const INGRESS_RELATION: &str = "ingress";

/// Application data understood by the nginx ingress integrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngressData {
    pub service_hostname: String,
    pub service_name: String,
    pub service_port: u16,
}

impl IngressData {
    pub const KEYS: [&'static str; 3] = ["service-hostname", "service-name", "service-port"];

    pub fn new(hostname: impl Into<String>, service_name: impl Into<String>, port: u16) -> Self {
        Self {
            service_hostname: hostname.into(),
            service_name: service_name.into(),
            service_port: port,
        }
    }

    /// Flatten into relation key/value pairs
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("service-hostname".to_string(), self.service_hostname.clone()),
            ("service-name".to_string(), self.service_name.clone()),
            ("service-port".to_string(), self.service_port.to_string()),
        ]
    }
}
