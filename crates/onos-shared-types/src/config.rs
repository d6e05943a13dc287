//! Charm configuration set
//!
//! Mirrors the options declared for the charm. Values arrive as the JSON
//! document printed by `config-get --format=json`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::onos::{GUI_APP, SYS_APP};

pub const DEFAULT_JAVA_OPTS: &str = "-XX:+UseG1GC -XX:MaxGCPauseMillis=200";

/// Configuration errors, surfaced to the host as `ConfigurationInvalid`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for option '{option}': {reason}")]
    Invalid { option: String, reason: String },

    #[error("malformed configuration: {reason}")]
    Malformed { reason: String },
}

impl ConfigError {
    fn invalid(option: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// Option the error is about, if it concerns a single option
    pub fn option(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { option, .. } => Some(option),
            ConfigError::Malformed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CharmConfig {
    /// Activate the ONOS web GUI application at boot
    #[serde(default)]
    pub enable_gui: bool,

    /// Value of JAVA_OPTS for the ONOS JVM
    #[serde(default = "default_java_opts")]
    pub java_opts: String,

    #[serde(default)]
    pub admin_password: Option<String>,

    /// Create the read-only `guest` user
    #[serde(default)]
    pub enable_guest: bool,

    #[serde(default)]
    pub guest_password: Option<String>,

    /// Hostname advertised to the ingress provider
    #[serde(default)]
    pub external_hostname: Option<String>,
}

fn default_java_opts() -> String {
    DEFAULT_JAVA_OPTS.to_string()
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            enable_gui: false,
            java_opts: default_java_opts(),
            admin_password: None,
            enable_guest: false,
            guest_password: None,
            external_hostname: None,
        }
    }
}

impl CharmConfig {
    /// Options recognised by the reconciler
    pub const OPTIONS: [&'static str; 6] = [
        "enable-gui",
        "java-opts",
        "admin-password",
        "enable-guest",
        "guest-password",
        "external-hostname",
    ];

    /// Parse a `config-get --format=json` document
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Check the values that cannot be expressed in the option types
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.admin_password()?;

        if self.enable_guest {
            self.guest_password()?;
        }

        if self.java_opts.contains(['\n', '\r']) {
            return Err(ConfigError::invalid("java-opts", "must be a single line"));
        }

        if let Some(hostname) = self.external_hostname() {
            validate_hostname(hostname)
                .map_err(|reason| ConfigError::invalid("external-hostname", reason))?;
        }

        Ok(())
    }

    pub fn admin_password(&self) -> Result<&str, ConfigError> {
        non_empty(self.admin_password.as_deref()).ok_or_else(|| {
            ConfigError::invalid(
                "admin-password",
                "not set, run: juju config <app> admin-password=<pass>",
            )
        })
    }

    pub fn guest_password(&self) -> Result<&str, ConfigError> {
        non_empty(self.guest_password.as_deref()).ok_or_else(|| {
            ConfigError::invalid(
                "guest-password",
                "required when enable-guest is set, run: juju config <app> guest-password=<pass>",
            )
        })
    }

    /// External hostname, treating an empty string as unset
    pub fn external_hostname(&self) -> Option<&str> {
        non_empty(self.external_hostname.as_deref())
    }

    /// Applications ONOS activates at boot, in activation order
    pub fn boot_apps(&self) -> Vec<&'static str> {
        let mut apps = vec![SYS_APP];
        if self.enable_gui {
            apps.push(GUI_APP);
        }
        apps
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn hostname_label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
            .expect("hostname label pattern is valid")
    })
}

/// RFC 1123 host name check
pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    if hostname.len() > 253 {
        return Err(format!("'{}' is longer than 253 characters", hostname));
    }

    let labels: Vec<&str> = hostname.trim_end_matches('.').split('.').collect();
    if let Some(label) = labels
        .iter()
        .find(|label| !hostname_label_regex().is_match(label))
    {
        return Err(format!("'{}' has an invalid label '{}'", hostname, label));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_admin() -> CharmConfig {
        CharmConfig {
            admin_password: Some("secret".to_string()),
            ..CharmConfig::default()
        }
    }

    #[test]
    fn test_parse_config_get_output() {
        let config = CharmConfig::from_json_str(
            r#"{"enable-gui": true, "java-opts": "-Xmx2G", "admin-password": "pw",
                "enable-guest": false, "external-hostname": "onos.example.com"}"#,
        )
        .unwrap();

        assert!(config.enable_gui);
        assert_eq!(config.java_opts, "-Xmx2G");
        assert_eq!(config.admin_password().unwrap(), "pw");
        assert_eq!(config.external_hostname(), Some("onos.example.com"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let err = CharmConfig::from_json_str(r#"{"enable-gui": "yes"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_option_is_malformed() {
        let err = CharmConfig::from_json_str(r#"{"enable-telnet": true}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_admin_password_required() {
        let err = CharmConfig::default().validate().unwrap_err();
        assert_eq!(err.option(), Some("admin-password"));

        let blank = CharmConfig {
            admin_password: Some("  ".to_string()),
            ..CharmConfig::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_guest_password_required_when_enabled() {
        let mut config = config_with_admin();
        config.enable_guest = true;
        assert_eq!(config.validate().unwrap_err().option(), Some("guest-password"));

        config.guest_password = Some("guest".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hostname_validation() {
        assert!(validate_hostname("onos.example.com").is_ok());
        assert!(validate_hostname("onos").is_ok());
        assert!(validate_hostname("-bad.example.com").is_err());
        assert!(validate_hostname("under_score.example.com").is_err());

        let mut config = config_with_admin();
        config.external_hostname = Some("not a host".to_string());
        assert_eq!(
            config.validate().unwrap_err().option(),
            Some("external-hostname")
        );

        config.external_hostname = Some(String::new());
        assert!(config.validate().is_ok());
        assert_eq!(config.external_hostname(), None);
    }

    #[test]
    fn test_boot_apps_follow_gui_toggle() {
        let mut config = config_with_admin();
        assert_eq!(config.boot_apps(), vec![SYS_APP]);
        config.enable_gui = true;
        assert_eq!(config.boot_apps(), vec![SYS_APP, GUI_APP]);
    }
}
