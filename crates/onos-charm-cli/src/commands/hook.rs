//! Host event commands

use anyhow::Result;
use onos_charm::{on_config_changed, on_invalid_config, on_pebble_ready, CharmContext, ReconcileOutcome};
use onos_shared_types::{CharmConfig, ConfigError};

/// Handles `config-changed` and `pebble-ready`
pub struct HookCommand {
    context: CharmContext,
}

impl HookCommand {
    pub fn new(context: CharmContext) -> Self {
        Self { context }
    }

    /// `config` is the parsed option set; an error blocks the unit
    pub async fn config_changed(
        mut self,
        config: std::result::Result<CharmConfig, ConfigError>,
    ) -> Result<ReconcileOutcome> {
        let result = match config {
            Ok(_) => on_config_changed(&mut self.context).await,
            Err(err) => Err(on_invalid_config(&mut self.context, err).await),
        };
        self.finish(result).await
    }

    pub async fn pebble_ready(
        mut self,
        config: std::result::Result<CharmConfig, ConfigError>,
    ) -> Result<ReconcileOutcome> {
        let result = match config {
            Ok(_) => on_pebble_ready(&mut self.context).await,
            Err(err) => {
                // the container is up even though nothing can be applied
                self.context.state.ready = true;
                Err(on_invalid_config(&mut self.context, err).await)
            }
        };
        self.finish(result).await
    }

    /// Persist the state whatever the outcome, then report
    async fn finish(
        mut self,
        result: onos_charm::Result<ReconcileOutcome>,
    ) -> Result<ReconcileOutcome> {
        self.context.persist().await?;
        let outcome = result?;
        super::print_json(&outcome)?;
        Ok(outcome)
    }
}
