//! Action dispatcher
//!
//! Turns one host action into exactly one operation. All validation happens
//! before anything leaves the process: an invocation that does not resolve
//! to an [`Action`] never reaches ONOS or the workload.

use std::collections::BTreeMap;

use log::{debug, info};
use onos_shared_types::{Action, ActionInvocation, ActionName, CharmEvent};
use serde::Serialize;

use crate::context::CharmContext;
use crate::error::Result;
use crate::routes::{operation_for, Operation};
use crate::service;

/// Result of a successful action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub action: ActionName,
    pub output: String,
    /// Upstream response body, exactly as ONOS sent it
    pub body: Option<String>,
}

impl ActionOutcome {
    /// Key/value pairs handed to `action-set`
    pub fn results(&self) -> BTreeMap<String, String> {
        let mut results = BTreeMap::new();
        results.insert("output".to_string(), self.output.clone());

        if let Some(ref body) = self.body {
            let key = match self.action {
                ActionName::ListActivatedApps => "activated-apps",
                ActionName::ListAvailableApps => "available-apps",
                ActionName::ListRoles => "roles",
                _ => "body",
            };
            if !body.is_empty() {
                results.insert(key.to_string(), body.clone());
            }
        }

        results
    }
}

pub async fn dispatch(ctx: &CharmContext, invocation: &ActionInvocation) -> Result<ActionOutcome> {
    let action = match Action::from_invocation(invocation) {
        Ok(action) => action,
        Err(err) => {
            if let Ok(name) = invocation.name.parse::<ActionName>() {
                ctx.emit(CharmEvent::ActionCompleted {
                    action: name,
                    success: false,
                })
                .await;
            }
            return Err(err.into());
        }
    };

    let result = execute(ctx, &action).await;
    ctx.emit(CharmEvent::ActionCompleted {
        action: action.name(),
        success: result.is_ok(),
    })
    .await;
    result
}

/// Run an already validated action
pub async fn execute(ctx: &CharmContext, action: &Action) -> Result<ActionOutcome> {
    let name = action.name();

    match operation_for(action) {
        Operation::Service(signal) => {
            let output = service::signal(ctx.workload.as_ref(), signal).await?;
            Ok(ActionOutcome {
                action: name,
                output,
                body: None,
            })
        }
        Operation::Api(request) => {
            // the API is only reachable with the admin credentials
            ctx.config.admin_password()?;

            debug!("Action {} -> {}", name, request.key());
            let response = ctx.api.call(&request).await?;
            info!("Action {} completed with status {}", name, response.status);

            Ok(ActionOutcome {
                action: name,
                output: format!("{} completed", name),
                body: Some(response.body),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_use_action_specific_keys() {
        let outcome = ActionOutcome {
            action: ActionName::ListRoles,
            output: "list-roles completed".to_string(),
            body: Some("{\"roles\":[]}".to_string()),
        };
        let results = outcome.results();
        assert_eq!(results["roles"], "{\"roles\":[]}");
        assert_eq!(results["output"], "list-roles completed");
    }

    #[test]
    fn test_empty_body_is_omitted() {
        let outcome = ActionOutcome {
            action: ActionName::DeleteUser,
            output: "delete-user completed".to_string(),
            body: Some(String::new()),
        };
        assert_eq!(outcome.results().len(), 1);
    }
}
