//! Configuration reconciler
//!
//! Derives the workload definition and ingress data from the current
//! configuration and applies only what differs from the last applied state
//! recorded in [`CharmState`](crate::state::CharmState). Running it twice
//! with the same configuration does nothing the second time.

use std::path::{Path, PathBuf};

use log::{debug, info};
use onos_shared_types::ingress::INGRESS_RELATION;
use onos_shared_types::onos::SERVICE_NAME;
use onos_shared_types::{CharmEvent, ConfigChange, IngressData};
use serde::Serialize;

use crate::context::CharmContext;
use crate::error::Result;
use crate::plan::{DerivedState, FileMode, ManagedFile, KARAF_DIR_PREFIX};
use crate::service;
use crate::workload::{Workload, WorkloadError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub changes: Vec<ConfigChange>,
    pub restarted: bool,
    /// The workload differs from the derived one but the container is not ready
    pub deferred_workload: bool,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty() && !self.restarted
    }
}

/// Bring the workload and ingress data in line with `ctx.config`.
///
/// `force_workload` re-applies the workload even when it matches the
/// recorded state, for a container whose filesystem may have been replaced.
pub async fn reconcile(ctx: &mut CharmContext, force_workload: bool) -> Result<ReconcileOutcome> {
    let derived = DerivedState::derive(&ctx.config, &ctx.settings)?;
    let mut outcome = ReconcileOutcome::default();

    // only recorded once a relation took the data, so a later relation or
    // leadership change still gets it
    if derived.ingress != ctx.state.applied_ingress
        && publish_ingress(ctx, derived.ingress.as_ref()).await?
    {
        ctx.state.applied_ingress = derived.ingress.clone();
        outcome.changes.push(ConfigChange::Ingress);
    }

    let applied = if force_workload {
        None
    } else {
        ctx.state.applied_workload.as_ref()
    };
    let files_changed = applied.map_or(true, |spec| spec.files != derived.workload.files);
    let layer_changed = applied.map_or(true, |spec| spec.layer != derived.workload.layer);

    if !ctx.state.ready {
        outcome.deferred_workload = files_changed || layer_changed;
        if outcome.deferred_workload {
            info!("Workload container not ready, deferring workload update");
        }
    } else {
        if files_changed {
            write_managed_files(ctx.workload.as_ref(), &ctx.settings.onos_root, &derived.workload.files)
                .await?;
            outcome.changes.push(ConfigChange::ManagedFiles);
        }

        if layer_changed {
            ctx.workload
                .add_layer(SERVICE_NAME, &derived.workload.layer)
                .await?;
            service::restart(ctx.workload.as_ref()).await?;
            ctx.state.started = true;
            outcome.changes.push(ConfigChange::Environment);
            outcome.restarted = true;
            ctx.emit(CharmEvent::WorkloadRestarted {
                service: SERVICE_NAME.to_string(),
            })
            .await;
        }

        ctx.state.applied_workload = Some(derived.workload);
    }

    if outcome.changes.is_empty() {
        debug!("Configuration unchanged, nothing to apply");
    } else {
        ctx.emit(CharmEvent::ConfigApplied {
            changes: outcome.changes.clone(),
        })
        .await;
    }

    Ok(outcome)
}

/// Returns whether any relation was written
async fn publish_ingress(ctx: &CharmContext, ingress: Option<&IngressData>) -> Result<bool> {
    let fields = match ingress {
        Some(data) => data.to_fields(),
        // empty values remove the keys
        None => IngressData::KEYS
            .iter()
            .map(|key| (key.to_string(), String::new()))
            .collect(),
    };

    let written = ctx
        .relations
        .publish_app_data(INGRESS_RELATION, &fields)
        .await?;
    if written == 0 {
        info!("No {} relation written, ingress data stays pending", INGRESS_RELATION);
        return Ok(false);
    }
    debug!("Ingress data written to {} relation(s)", written);

    ctx.emit(CharmEvent::IngressUpdated {
        hostname: ingress.map(|data| data.service_hostname.clone()),
    })
    .await;
    Ok(true)
}

/// Locate the Karaf release directory below the ONOS root
async fn karaf_dir(workload: &dyn Workload, onos_root: &Path) -> Result<PathBuf> {
    let dirs = workload.list_dirs(onos_root).await?;
    let karaf = dirs
        .into_iter()
        .filter(|name| name.starts_with(KARAF_DIR_PREFIX))
        .max()
        .ok_or_else(|| {
            WorkloadError::PathNotFound(format!(
                "{}/{}*",
                onos_root.display(),
                KARAF_DIR_PREFIX
            ))
        })?;
    Ok(onos_root.join(karaf))
}

async fn write_managed_files(
    workload: &dyn Workload,
    onos_root: &Path,
    files: &[ManagedFile],
) -> Result<()> {
    let karaf = karaf_dir(workload, onos_root).await?;

    for file in files {
        let path = karaf.join(&file.relative_path);
        match file.mode {
            FileMode::Replace => {
                workload.push(&path, &file.content).await?;
                info!("Wrote {}", path.display());
            }
            FileMode::EnsureAppended => {
                let existing = workload.pull(&path).await?.unwrap_or_default();
                if existing.contains(file.content.trim()) {
                    debug!("{} already up to date", path.display());
                    continue;
                }
                workload
                    .push(&path, &format!("{}{}", existing, file.content))
                    .await?;
                info!("Appended managed section to {}", path.display());
            }
        }
    }

    Ok(())
}
