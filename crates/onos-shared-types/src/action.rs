//! Action catalog and typed action invocations
//!
//! The host hands every action over as a name plus a flat map of string
//! parameters. [`Action::from_invocation`] checks that map against the
//! [`ActionDescriptor`] of the action and turns it into a typed [`Action`],
//! so nothing past this module ever looks at raw parameter maps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SharedTypeError;
use crate::onos::{is_reserved_group_name, is_reserved_username};

/// Errors raised while resolving an invocation into an [`Action`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    #[error("action {action}: missing required parameter '{parameter}'")]
    MissingParameter {
        action: ActionName,
        parameter: String,
    },

    #[error("action {action}: unknown parameter '{parameter}'")]
    UnknownParameter {
        action: ActionName,
        parameter: String,
    },

    #[error("action {action}: invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        action: ActionName,
        parameter: String,
        reason: String,
    },

    #[error("action {action}: {parameter} '{value}' is reserved")]
    ReservedName {
        action: ActionName,
        parameter: String,
        value: String,
    },
}

/// Names of every action the operator exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionName {
    Restart,
    Start,
    Stop,
    ListActivatedApps,
    ListAvailableApps,
    ListRoles,
    ActivateApp,
    DeactivateApp,
    AddUser,
    DeleteUser,
    AddGroup,
    DeleteGroup,
}

impl ActionName {
    pub const ALL: [ActionName; 12] = [
        ActionName::Restart,
        ActionName::Start,
        ActionName::Stop,
        ActionName::ListActivatedApps,
        ActionName::ListAvailableApps,
        ActionName::ListRoles,
        ActionName::ActivateApp,
        ActionName::DeactivateApp,
        ActionName::AddUser,
        ActionName::DeleteUser,
        ActionName::AddGroup,
        ActionName::DeleteGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::Restart => "restart",
            ActionName::Start => "start",
            ActionName::Stop => "stop",
            ActionName::ListActivatedApps => "list-activated-apps",
            ActionName::ListAvailableApps => "list-available-apps",
            ActionName::ListRoles => "list-roles",
            ActionName::ActivateApp => "activate-app",
            ActionName::DeactivateApp => "deactivate-app",
            ActionName::AddUser => "add-user",
            ActionName::DeleteUser => "delete-user",
            ActionName::AddGroup => "add-group",
            ActionName::DeleteGroup => "delete-group",
        }
    }

    pub fn descriptor(&self) -> ActionDescriptor {
        let (description, params): (&'static str, Vec<ParamSpec>) = match self {
            ActionName::Restart => ("Restart the ONOS service", Vec::new()),
            ActionName::Start => ("Start the ONOS service", Vec::new()),
            ActionName::Stop => ("Stop the ONOS service", Vec::new()),
            ActionName::ListActivatedApps => ("List the activated ONOS applications", Vec::new()),
            ActionName::ListAvailableApps => ("List every installed ONOS application", Vec::new()),
            ActionName::ListRoles => ("List the roles groups can be granted", Vec::new()),
            ActionName::ActivateApp => (
                "Activate an ONOS application",
                vec![ParamSpec::required("name", "Application id, e.g. org.onosproject.acl")],
            ),
            ActionName::DeactivateApp => (
                "Deactivate an ONOS application",
                vec![ParamSpec::required("name", "Application id, e.g. org.onosproject.acl")],
            ),
            ActionName::AddUser => (
                "Add a user to an existing group",
                vec![
                    ParamSpec::required("username", "Name of the new user"),
                    ParamSpec::required("password", "Password of the new user"),
                    ParamSpec::required("group", "Group the user joins"),
                ],
            ),
            ActionName::DeleteUser => (
                "Delete a user",
                vec![ParamSpec::required("username", "Name of the user to delete")],
            ),
            ActionName::AddGroup => (
                "Add a group with a set of roles",
                vec![
                    ParamSpec::required("groupname", "Name of the new group"),
                    ParamSpec::required(
                        "roles",
                        "Comma separated roles without spaces, see list-roles",
                    ),
                ],
            ),
            ActionName::DeleteGroup => (
                "Delete a group",
                vec![ParamSpec::required("groupname", "Name of the group to delete")],
            ),
        };

        ActionDescriptor {
            name: *self,
            description,
            params,
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Hook dispatchers sometimes hand over the snake_case event name
        let normalized = s.trim().replace('_', "-");
        ActionName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == normalized)
            .ok_or_else(|| ActionError::UnknownAction {
                name: s.to_string(),
            })
    }
}

/// One declared action parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
        }
    }
}

/// Host-facing description of an action, also used for validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    pub name: ActionName,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ActionDescriptor {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Reject unknown parameters and missing or empty required ones
    pub fn validate(&self, params: &BTreeMap<String, String>) -> Result<(), ActionError> {
        if let Some(unknown) = params.keys().find(|key| self.param(key).is_none()) {
            return Err(ActionError::UnknownParameter {
                action: self.name,
                parameter: unknown.clone(),
            });
        }

        for spec in self.params.iter().filter(|spec| spec.required) {
            let present = params
                .get(spec.name)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false);
            if !present {
                return Err(ActionError::MissingParameter {
                    action: self.name,
                    parameter: spec.name.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Descriptors of every action, in declaration order
pub fn catalog() -> Vec<ActionDescriptor> {
    ActionName::ALL.iter().map(ActionName::descriptor).collect()
}

/// Raw action request as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ActionInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parse `key=value` command line arguments into an invocation
    pub fn from_args<I, S>(name: impl Into<String>, args: I) -> Result<Self, SharedTypeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invocation = Self::new(name);
        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| SharedTypeError::ParseError(format!("expected key=value, got '{}'", arg)))?;
            if key.is_empty() {
                return Err(SharedTypeError::InvalidValue {
                    field: "parameter",
                    value: arg.to_string(),
                });
            }
            invocation.params.insert(key.to_string(), value.to_string());
        }
        Ok(invocation)
    }
}

/// Roles a Karaf group can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Group,
    Admin,
    Manager,
    Viewer,
    SystemBundles,
    Ssh,
    WebConsole,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Group,
        Role::Admin,
        Role::Manager,
        Role::Viewer,
        Role::SystemBundles,
        Role::Ssh,
        Role::WebConsole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Group => "group",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
            Role::SystemBundles => "systembundles",
            Role::Ssh => "ssh",
            Role::WebConsole => "webconsole",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| SharedTypeError::InvalidValue {
                field: "role",
                value: s.to_string(),
            })
    }
}

/// A validated action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Restart,
    Start,
    Stop,
    ListActivatedApps,
    ListAvailableApps,
    ListRoles,
    ActivateApp {
        name: String,
    },
    DeactivateApp {
        name: String,
    },
    AddUser {
        username: String,
        password: String,
        group: String,
    },
    DeleteUser {
        username: String,
    },
    AddGroup {
        groupname: String,
        roles: Vec<Role>,
    },
    DeleteGroup {
        groupname: String,
    },
}

impl Action {
    pub fn name(&self) -> ActionName {
        match self {
            Action::Restart => ActionName::Restart,
            Action::Start => ActionName::Start,
            Action::Stop => ActionName::Stop,
            Action::ListActivatedApps => ActionName::ListActivatedApps,
            Action::ListAvailableApps => ActionName::ListAvailableApps,
            Action::ListRoles => ActionName::ListRoles,
            Action::ActivateApp { .. } => ActionName::ActivateApp,
            Action::DeactivateApp { .. } => ActionName::DeactivateApp,
            Action::AddUser { .. } => ActionName::AddUser,
            Action::DeleteUser { .. } => ActionName::DeleteUser,
            Action::AddGroup { .. } => ActionName::AddGroup,
            Action::DeleteGroup { .. } => ActionName::DeleteGroup,
        }
    }

    /// Resolve and validate a raw invocation
    pub fn from_invocation(invocation: &ActionInvocation) -> Result<Self, ActionError> {
        let name: ActionName = invocation.name.parse()?;
        name.descriptor().validate(&invocation.params)?;

        let param = |key: &str| -> String {
            invocation
                .params
                .get(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let action = match name {
            ActionName::Restart => Action::Restart,
            ActionName::Start => Action::Start,
            ActionName::Stop => Action::Stop,
            ActionName::ListActivatedApps => Action::ListActivatedApps,
            ActionName::ListAvailableApps => Action::ListAvailableApps,
            ActionName::ListRoles => Action::ListRoles,
            ActionName::ActivateApp => Action::ActivateApp { name: param("name") },
            ActionName::DeactivateApp => Action::DeactivateApp { name: param("name") },
            ActionName::AddUser => {
                let username = reject_reserved_user(name, param("username"))?;
                Action::AddUser {
                    username,
                    // passwords are taken verbatim
                    password: invocation.params["password"].clone(),
                    group: param("group"),
                }
            }
            ActionName::DeleteUser => Action::DeleteUser {
                username: reject_reserved_user(name, param("username"))?,
            },
            ActionName::AddGroup => {
                let groupname = reject_reserved_group(name, param("groupname"))?;
                let roles = parse_roles(&param("roles")).map_err(|reason| {
                    ActionError::InvalidParameter {
                        action: name,
                        parameter: "roles".to_string(),
                        reason,
                    }
                })?;
                Action::AddGroup { groupname, roles }
            }
            ActionName::DeleteGroup => Action::DeleteGroup {
                groupname: reject_reserved_group(name, param("groupname"))?,
            },
        };

        Ok(action)
    }
}

fn reject_reserved_user(action: ActionName, username: String) -> Result<String, ActionError> {
    if is_reserved_username(&username) {
        return Err(ActionError::ReservedName {
            action,
            parameter: "username".to_string(),
            value: username,
        });
    }
    Ok(username)
}

fn reject_reserved_group(action: ActionName, groupname: String) -> Result<String, ActionError> {
    if is_reserved_group_name(&groupname) {
        return Err(ActionError::ReservedName {
            action,
            parameter: "groupname".to_string(),
            value: groupname,
        });
    }
    Ok(groupname)
}

/// Parse a comma separated role list such as `group,viewer`
pub fn parse_roles(roles: &str) -> Result<Vec<Role>, String> {
    if roles.is_empty() {
        return Err("roles must not be empty".to_string());
    }

    let mut parsed = Vec::new();
    let mut unknown = Vec::new();
    for role in roles.split(',') {
        if role.is_empty() || !role.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("role '{}' is not alphanumeric", role));
        }
        match role.parse::<Role>() {
            Ok(role) if !parsed.contains(&role) => parsed.push(role),
            Ok(_) => {}
            Err(_) => unknown.push(role),
        }
    }

    if !unknown.is_empty() {
        return Err(format!("unknown role(s): {}", unknown.join(", ")));
    }

    Ok(parsed)
}
