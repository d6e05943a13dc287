//! Derivation of the workload definition from the charm configuration
//!
//! Everything here is a pure function of [`CharmConfig`] and
//! [`CharmSettings`]: the same inputs always produce the same [`DerivedState`].

use indexmap::IndexMap;
use onos_shared_types::onos::{
    ADMIN_GROUP_NAME, ADMIN_USERNAME, GUEST_GROUP_NAME, GUEST_USERNAME, SERVICE_NAME, WEB_PORT,
};
use onos_shared_types::{CharmConfig, ConfigError, IngressData, Role};
use serde::{Deserialize, Serialize};

use crate::settings::CharmSettings;
use crate::workload::{Layer, ServiceDefinition};

pub const USERS_PROPERTIES: &str = "etc/users.properties";
pub const LOGGING_CFG: &str = "etc/org.ops4j.pax.logging.cfg";
pub const KARAF_DIR_PREFIX: &str = "apache-karaf-";

pub const ASYNC_LOGGING: &str = "
log4j.appender.async=org.apache.log4j.AsyncAppender
log4j.appender.async.appenders=rolling
";

const JAVA_HOME: &str = "/usr/lib/jvm/zulu11-ca-amd64";
const PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// How a managed file is written into the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileMode {
    /// Overwrite the file with the content
    Replace,
    /// Append the content unless the file already contains it
    EnsureAppended,
}

/// File below the Karaf directory kept in sync by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    pub relative_path: String,
    pub content: String,
    pub mode: FileMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub layer: Layer,
    pub files: Vec<ManagedFile>,
}

impl WorkloadSpec {
    /// Environment of the ONOS service
    pub fn environment(&self) -> Option<&IndexMap<String, String>> {
        self.layer
            .services
            .get(SERVICE_NAME)
            .map(|service| &service.environment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedState {
    pub workload: WorkloadSpec,
    pub ingress: Option<IngressData>,
}

impl DerivedState {
    /// Validate `config` and compute everything that follows from it
    pub fn derive(config: &CharmConfig, settings: &CharmSettings) -> Result<Self, ConfigError> {
        config.validate()?;

        let workload = WorkloadSpec {
            layer: build_layer(config, settings),
            files: vec![
                ManagedFile {
                    relative_path: USERS_PROPERTIES.to_string(),
                    content: render_users_properties(config)?,
                    mode: FileMode::Replace,
                },
                ManagedFile {
                    relative_path: LOGGING_CFG.to_string(),
                    content: ASYNC_LOGGING.to_string(),
                    mode: FileMode::EnsureAppended,
                },
            ],
        };

        let ingress = config
            .external_hostname()
            .map(|hostname| IngressData::new(hostname, settings.app_name.clone(), WEB_PORT));

        Ok(Self { workload, ingress })
    }
}

pub fn build_layer(config: &CharmConfig, settings: &CharmSettings) -> Layer {
    let mut environment = IndexMap::new();
    environment.insert("PATH".to_string(), PATH.to_string());
    environment.insert("LANG".to_string(), "en_US.UTF-8".to_string());
    environment.insert("LANGUAGE".to_string(), "en_US:en".to_string());
    environment.insert("LC_ALL".to_string(), "en_US.UTF-8".to_string());
    environment.insert("JAVA_HOME".to_string(), JAVA_HOME.to_string());
    environment.insert("JAVA_OPTS".to_string(), config.java_opts.trim().to_string());
    environment.insert("ONOS_APPS".to_string(), config.boot_apps().join(","));

    let mut services = IndexMap::new();
    services.insert(
        SERVICE_NAME.to_string(),
        ServiceDefinition {
            override_mode: "replace".to_string(),
            summary: "onos service".to_string(),
            command: "./bin/onos-service".to_string(),
            startup: "enabled".to_string(),
            working_dir: Some(settings.onos_root.to_string_lossy().to_string()),
            environment,
        },
    );

    Layer {
        summary: "onos layer".to_string(),
        description: "pebble config layer for onos".to_string(),
        services,
    }
}

/// Render the Karaf `users.properties` realm for the admin and guest users
pub fn render_users_properties(config: &CharmConfig) -> Result<String, ConfigError> {
    let mut users = vec![(ADMIN_USERNAME, config.admin_password()?, ADMIN_GROUP_NAME)];
    if config.enable_guest {
        users.push((GUEST_USERNAME, config.guest_password()?, GUEST_GROUP_NAME));
    }

    let groups = [
        (ADMIN_GROUP_NAME, Role::ALL.to_vec()),
        (GUEST_GROUP_NAME, vec![Role::Group, Role::Viewer]),
    ];

    let mut out = String::new();
    for (user, password, group) in users {
        out.push_str(&format!("{} = {},_g_:{}\n", user, password, group));
    }
    out.push('\n');
    for (group, roles) in groups {
        let roles: Vec<&str> = roles.iter().map(Role::as_str).collect();
        out.push_str(&format!("_g_\\:{} = {}\n", group, roles.join(",")));
    }

    Ok(out)
}
