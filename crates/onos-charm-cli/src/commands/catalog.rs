//! List-actions command

use anyhow::Result;
use onos_shared_types::{catalog, ActionDescriptor};

pub struct CatalogCommand;

impl CatalogCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self) -> Result<Vec<ActionDescriptor>> {
        let descriptors = catalog();
        super::print_json(&descriptors)?;
        Ok(descriptors)
    }
}

impl Default for CatalogCommand {
    fn default() -> Self {
        Self::new()
    }
}
