//! ONOS operator charm entry point
//!
//! Each invocation of the `onos-charm` binary handles one host event or one
//! action and exits. The commands in [`commands`] do the work; this crate
//! only wires settings, configuration and output together.

pub mod commands;
pub mod config_source;

pub use config_source::ConfigSource;
