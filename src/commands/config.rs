//! Config command handlers: show effective configuration.

use anyhow::Result;

use crate::ProcessExit;
use crate::app_config::{LoadedConfig, Settings};

pub fn run_config_show_command(settings: &Settings, loaded: &LoadedConfig) -> Result<ProcessExit> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("cache_path = {}", settings.cache_location.path().display());
    println!("max_age_hours = {}", settings.max_age_hours);
    println!("notebooklm_url = {}", settings.target_url);

    Ok(ProcessExit::Success)
}
