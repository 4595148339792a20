//! `config` subcommands

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::config::{load_settings_or_default, save_settings, Settings};

pub fn run_config_show(path: &Path, settings: &Settings) -> Result<()> {
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

/// Persist one setting
///
/// An invalid key or value is an error. A failed write is logged and the
/// run continues with the in-memory value.
pub fn run_config_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings_or_default(path);
    settings.set(key, value)?;

    match save_settings(path, &settings) {
        Ok(()) => println!("Set {} = {}", key, value),
        Err(e) => warn!("Settings not saved: {}", e),
    }
    Ok(())
}

pub fn run_config_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}
