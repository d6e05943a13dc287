//! Event bus listeners installed by the charm

use async_trait::async_trait;
use log::{info, warn};
use onos_event_bus::EventListener;
use onos_shared_types::CharmEvent;

use crate::host::HookTools;

/// Records every charm event in the log
pub struct CharmEventLogger;

#[async_trait]
impl EventListener for CharmEventLogger {
    async fn on_event(&self, event: &CharmEvent) -> anyhow::Result<()> {
        match event {
            CharmEvent::ActionCompleted {
                action,
                success: false,
            } => warn!("Action {} failed", action),
            other => info!("Charm event: {:?}", other),
        }
        Ok(())
    }
}

/// Mirrors status changes to the host with `status-set`
pub struct HostStatusReporter {
    tools: HookTools,
}

impl HostStatusReporter {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl EventListener for HostStatusReporter {
    async fn on_event(&self, event: &CharmEvent) -> anyhow::Result<()> {
        if let CharmEvent::StatusChanged { status } = event {
            self.tools.status_set(status).await?;
        }
        Ok(())
    }
}
