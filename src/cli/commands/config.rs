//! Config Command
//!
//! Manage codetree configuration.
//!
//! Usage:
//!   codetree config show [--json]
//!   codetree config path
//!   codetree config init [-g] [--force]

use crate::cli::ui::output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(as_json: bool) -> Result<()> {
    ConfigLoader::show_config(as_json)
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default configuration file
pub fn init(global: bool, force: bool) -> Result<()> {
    let config_path = ConfigLoader::init(global, force)?;
    output::initialized(global, &config_path);
    Ok(())
}
