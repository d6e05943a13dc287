//! CLI commands

pub mod action;
pub mod catalog;
pub mod hook;
pub mod settings;
pub mod status;

pub use action::{report_failure, ActionCommand};
pub use catalog::CatalogCommand;
pub use hook::HookCommand;
pub use settings::GenerateSettingsCommand;
pub use status::StatusCommand;

use anyhow::Result;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
