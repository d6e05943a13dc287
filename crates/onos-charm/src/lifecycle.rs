//! Handlers for the host events the charm observes

use log::{info, warn};
use onos_shared_types::{CharmEvent, ConfigError, UnitStatus};

use crate::context::CharmContext;
use crate::error::{CharmError, Result};
use crate::reconciler::{reconcile, ReconcileOutcome};

const WAITING_FOR_PEBBLE: &str = "Waiting for Pebble in workload container";

/// Reconcile after a configuration change and report the resulting status
pub async fn on_config_changed(ctx: &mut CharmContext) -> Result<ReconcileOutcome> {
    let result = reconcile(ctx, false).await;
    settle(ctx, result).await
}

/// The workload container came up: its filesystem may be fresh, so the
/// whole workload is applied again and the service restarted
pub async fn on_pebble_ready(ctx: &mut CharmContext) -> Result<ReconcileOutcome> {
    info!("Workload container ready");
    ctx.state.ready = true;
    let result = reconcile(ctx, true).await;
    settle(ctx, result).await
}

/// Report a configuration that could not even be parsed
pub async fn on_invalid_config(ctx: &mut CharmContext, err: ConfigError) -> CharmError {
    set_status(ctx, UnitStatus::Blocked(blocked_message(&err))).await;
    CharmError::ConfigurationInvalid(err)
}

async fn settle(
    ctx: &mut CharmContext,
    result: Result<ReconcileOutcome>,
) -> Result<ReconcileOutcome> {
    match result {
        Ok(outcome) => {
            let status = if outcome.deferred_workload {
                UnitStatus::Waiting(WAITING_FOR_PEBBLE.to_string())
            } else {
                UnitStatus::Active
            };
            set_status(ctx, status).await;
            Ok(outcome)
        }
        Err(CharmError::ConfigurationInvalid(err)) => Err(on_invalid_config(ctx, err).await),
        Err(err) => {
            warn!("Reconcile failed: {}", err);
            Err(err)
        }
    }
}

/// Record `status` and publish it if it changed
pub async fn set_status(ctx: &mut CharmContext, status: UnitStatus) {
    if ctx.state.status == status {
        return;
    }
    info!("Unit status: {}", status);
    ctx.state.status = status.clone();
    ctx.emit(CharmEvent::StatusChanged { status }).await;
}

fn blocked_message(err: &ConfigError) -> String {
    match err {
        ConfigError::Invalid { option, .. }
            if option == "admin-password" || option == "guest-password" =>
        {
            format!("Config missing: {}", option)
        }
        ConfigError::Invalid { option, reason } => format!("Config invalid: {}: {}", option, reason),
        ConfigError::Malformed { reason } => format!("Config invalid: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_messages() {
        let missing = ConfigError::Invalid {
            option: "admin-password".to_string(),
            reason: "not set".to_string(),
        };
        assert_eq!(blocked_message(&missing), "Config missing: admin-password");

        let invalid = ConfigError::Invalid {
            option: "external-hostname".to_string(),
            reason: "bad label".to_string(),
        };
        assert_eq!(
            blocked_message(&invalid),
            "Config invalid: external-hostname: bad label"
        );
    }
}
