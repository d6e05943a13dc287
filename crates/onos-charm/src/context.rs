//! Everything one event handler works with
//!
//! The host keeps no state for the charm between events apart from what is
//! written to the state file, so each process builds a [`CharmContext`],
//! handles a single event against it and persists the result.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use onos_client::{Credentials, HttpOnosApiClient, OnosApiClient};
use onos_event_bus::EventBus;
use onos_shared_types::onos::ADMIN_USERNAME;
use onos_shared_types::{CharmConfig, CharmEvent};

use crate::error::Result;
use crate::hooks::{CharmEventLogger, HostStatusReporter};
use crate::host::HookTools;
use crate::relation::{FileRelationStore, HookToolRelationStore, RelationStore};
use crate::settings::{CharmSettings, RelationBackend};
use crate::state::CharmState;
use crate::workload::{PebbleWorkload, Workload};

pub struct CharmContext {
    pub settings: CharmSettings,
    pub config: CharmConfig,
    pub state: CharmState,
    pub api: Arc<dyn OnosApiClient>,
    pub workload: Arc<dyn Workload>,
    pub relations: Arc<dyn RelationStore>,
    pub event_bus: Arc<EventBus>,
}

impl CharmContext {
    pub fn new(
        settings: CharmSettings,
        config: CharmConfig,
        state: CharmState,
        api: Arc<dyn OnosApiClient>,
        workload: Arc<dyn Workload>,
        relations: Arc<dyn RelationStore>,
    ) -> Self {
        Self {
            settings,
            config,
            state,
            api,
            workload,
            relations,
            event_bus: Arc::new(EventBus::new()),
        }
    }

    /// Build the production context: ONOS over HTTP, pebble for the
    /// workload and the relation backend chosen in the settings
    pub async fn bootstrap(settings: CharmSettings, config: CharmConfig) -> Result<Self> {
        let state = CharmState::load(&settings.state_file).await?;

        let mut api = HttpOnosApiClient::new(settings.api_base_url.clone(), settings.api_timeout())?;
        // without a password actions fail later with a configuration error
        if let Ok(password) = config.admin_password() {
            api = api.with_credentials(Credentials::new(ADMIN_USERNAME, password));
        }

        let mut workload = PebbleWorkload::new(settings.pebble_bin.clone(), settings.command_timeout());
        if let Some(ref socket) = settings.pebble_socket {
            workload = workload.with_socket(socket.clone());
        }

        let tools = HookTools::new(settings.hook_tools_dir.clone(), settings.command_timeout());
        let relations: Arc<dyn RelationStore> = match settings.relation_backend {
            RelationBackend::HookTools => Arc::new(HookToolRelationStore::new(tools.clone())),
            RelationBackend::File => Arc::new(FileRelationStore::new(settings.relation_file.clone())),
        };

        let report_to_host = settings.report_to_host;
        let context = Self::new(
            settings,
            config,
            state,
            Arc::new(api),
            Arc::new(workload),
            relations,
        );

        context
            .event_bus
            .register_listener("event-logger", CharmEventLogger)
            .await?;
        if report_to_host {
            context
                .event_bus
                .register_listener("status-reporter", HostStatusReporter::new(tools))
                .await?;
        }

        Ok(context)
    }

    /// Publish an event; listener failures are logged, never propagated
    pub async fn emit(&self, event: CharmEvent) {
        if let Err(err) = self.event_bus.publish(event).await {
            warn!("{}", err);
        }
    }

    /// Write the state file
    pub async fn persist(&mut self) -> Result<()> {
        self.state.updated_at = Some(Utc::now());
        self.state.save(&self.settings.state_file).await?;
        debug!("Persisted charm state to {}", self.settings.state_file.display());
        Ok(())
    }
}
