//! Generate-settings command

use std::path::Path;

use anyhow::{Context, Result};
use onos_charm::CharmSettings;

pub struct GenerateSettingsCommand;

impl GenerateSettingsCommand {
    pub fn new() -> Self {
        Self
    }

    /// Render the default settings, to `output` or stdout
    pub fn execute(&self, output: Option<&Path>) -> Result<String> {
        let rendered = CharmSettings::default().to_toml()?;

        match output {
            Some(path) => {
                std::fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Default settings written to: {}", path.display());
            }
            None => println!("{}", rendered),
        }

        Ok(rendered)
    }
}

impl Default for GenerateSettingsCommand {
    fn default() -> Self {
        Self::new()
    }
}
