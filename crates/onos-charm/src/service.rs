//! Start, stop and restart of the ONOS service

use log::info;
use onos_shared_types::onos::SERVICE_NAME;

use crate::error::{CharmError, Result};
use crate::routes::ServiceSignal;
use crate::workload::Workload;

pub async fn signal(workload: &dyn Workload, signal: ServiceSignal) -> Result<String> {
    match signal {
        ServiceSignal::Restart => restart(workload).await,
        ServiceSignal::Start => start(workload).await,
        ServiceSignal::Stop => stop(workload).await,
    }
}

/// Stop the service if it runs, then start it
pub async fn restart(workload: &dyn Workload) -> Result<String> {
    if workload.service_status(SERVICE_NAME).await?.is_active() {
        workload.stop(SERVICE_NAME).await?;
    }
    workload.start(SERVICE_NAME).await?;
    info!("Restarted {} service", SERVICE_NAME);
    Ok(format!("{} service restarted", SERVICE_NAME))
}

pub async fn start(workload: &dyn Workload) -> Result<String> {
    if workload.service_status(SERVICE_NAME).await?.is_active() {
        return Err(CharmError::ServiceState(format!(
            "{} service is already active",
            SERVICE_NAME
        )));
    }
    workload.start(SERVICE_NAME).await?;
    Ok(format!("{} service started", SERVICE_NAME))
}

pub async fn stop(workload: &dyn Workload) -> Result<String> {
    if !workload.service_status(SERVICE_NAME).await?.is_active() {
        return Err(CharmError::ServiceState(format!(
            "{} service is not running",
            SERVICE_NAME
        )));
    }
    workload.stop(SERVICE_NAME).await?;
    Ok(format!("{} service stopped", SERVICE_NAME))
}
