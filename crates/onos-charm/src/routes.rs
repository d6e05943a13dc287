//! Mapping from actions to what they do
//!
//! This table is the versioned contract with the ONOS REST API (`/onos/v1`).
//! Every action resolves to exactly one [`Operation`]: a single REST request,
//! or a service signal for the ones that control the container itself.

use onos_client::ApiRequest;
use onos_shared_types::Action;
use serde_json::json;
use urlencoding::encode;

const API_ROOT: &str = "/onos/v1";

/// Signal sent to the ONOS service in the workload container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSignal {
    Restart,
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Service(ServiceSignal),
    Api(ApiRequest),
}

pub fn operation_for(action: &Action) -> Operation {
    let request = match action {
        Action::Restart => return Operation::Service(ServiceSignal::Restart),
        Action::Start => return Operation::Service(ServiceSignal::Start),
        Action::Stop => return Operation::Service(ServiceSignal::Stop),

        Action::ListActivatedApps => {
            ApiRequest::get(format!("{}/applications", API_ROOT)).with_query("active", "true")
        }
        Action::ListAvailableApps => ApiRequest::get(format!("{}/applications", API_ROOT)),
        Action::ListRoles => ApiRequest::get(format!("{}/security/roles", API_ROOT)),
        Action::ActivateApp { name } => {
            ApiRequest::post(format!("{}/applications/{}/active", API_ROOT, encode(name)))
        }
        Action::DeactivateApp { name } => {
            ApiRequest::delete(format!("{}/applications/{}/active", API_ROOT, encode(name)))
        }
        Action::AddUser {
            username,
            password,
            group,
        } => ApiRequest::post(format!("{}/security/users", API_ROOT)).with_json(json!({
            "username": username,
            "password": password,
            "group": group,
        })),
        Action::DeleteUser { username } => {
            ApiRequest::delete(format!("{}/security/users/{}", API_ROOT, encode(username)))
        }
        Action::AddGroup { groupname, roles } => {
            let roles: Vec<&str> = roles.iter().map(|role| role.as_str()).collect();
            ApiRequest::post(format!("{}/security/groups", API_ROOT)).with_json(json!({
                "groupname": groupname,
                "roles": roles,
            }))
        }
        Action::DeleteGroup { groupname } => {
            ApiRequest::delete(format!("{}/security/groups/{}", API_ROOT, encode(groupname)))
        }
    };

    Operation::Api(request)
}
