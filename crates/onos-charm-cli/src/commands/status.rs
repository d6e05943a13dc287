//! Status command

use anyhow::{Context, Result};
use onos_charm::{CharmSettings, CharmState};
use onos_client::{Credentials, HttpOnosApiClient, OnosApiClient};
use serde_json::{json, Value};

/// Shows what the charm last recorded, optionally probing the ONOS API
pub struct StatusCommand {
    settings: CharmSettings,
    credentials: Option<Credentials>,
}

impl StatusCommand {
    pub fn new(settings: CharmSettings, credentials: Option<Credentials>) -> Self {
        Self {
            settings,
            credentials,
        }
    }

    pub async fn execute(&self, check_api: bool) -> Result<Value> {
        let state = CharmState::load(&self.settings.state_file)
            .await
            .context("Failed to load charm state")?;

        let environment = state
            .applied_workload
            .as_ref()
            .and_then(|spec| spec.environment())
            .map(|env| {
                // JAVA_OPTS and ONOS_APPS are the only config-driven entries
                env.iter()
                    .filter(|(key, _)| key.as_str() == "JAVA_OPTS" || key.as_str() == "ONOS_APPS")
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect::<serde_json::Map<_, _>>()
            });

        let mut report = json!({
            "status": state.status.name(),
            "message": state.status.message(),
            "ready": state.ready,
            "started": state.started,
            "environment": environment,
            "ingress": state.applied_ingress,
            "updated_at": state.updated_at,
        });

        if check_api {
            let mut client = HttpOnosApiClient::new(
                self.settings.api_base_url.clone(),
                self.settings.api_timeout(),
            )?;
            if let Some(ref credentials) = self.credentials {
                client = client.with_credentials(credentials.clone());
            }
            report["api_reachable"] = Value::Bool(client.health_check().await?);
        }

        super::print_json(&report)?;
        Ok(report)
    }
}
