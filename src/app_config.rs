//! Application configuration loading for CLI defaults.
//!
//! An optional `config.toml` lives next to the auth cache. Values there are
//! overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use notebooklm_auth::auth::{DEFAULT_TARGET_URL, default_cache_dir};
use notebooklm_auth::{CacheLocation, DEFAULT_MAX_AGE_HOURS};

use crate::cli::GlobalArgs;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Upper bound for `max_age_hours` (one year).
pub const MAX_AGE_HOURS_LIMIT: f64 = 8760.0;

/// File configuration for auth defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// Cache file location; relative paths resolve against the config directory.
    pub cache_path: Option<PathBuf>,
    /// Hours before cached credentials are refreshed.
    pub max_age_hours: Option<f64>,
    /// Page the user signs in to.
    pub notebooklm_url: Option<String>,
}

impl FileConfig {
    /// Validates config values against CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(hours) = self.max_age_hours
            && let Err(reason) = check_max_age_hours(hours)
        {
            bail!("Invalid config value for `max_age_hours`: {hours}. {reason}");
        }

        if let Some(target) = self.notebooklm_url.as_deref() {
            let parsed = url::Url::parse(target)
                .with_context(|| format!("Invalid config value for `notebooklm_url`: {target}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("Invalid config value for `notebooklm_url`: {target}. Expected an http(s) URL");
            }
        }

        Ok(())
    }
}

/// Checks a max-age value shared by the CLI flag and the config file.
pub fn check_max_age_hours(hours: f64) -> std::result::Result<(), String> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_AGE_HOURS_LIMIT {
        return Err(format!("Expected range: 0 < hours <= {MAX_AGE_HOURS_LIMIT}"));
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Effective settings after merging CLI flags, file config and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_location: CacheLocation,
    pub max_age_hours: f64,
    pub target_url: String,
}

/// Resolves the default config path: `config.toml` inside the cache directory.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_cache_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Merges CLI flags over file config over built-in defaults.
pub fn resolve_settings(args: &GlobalArgs, loaded: &LoadedConfig) -> Result<Settings> {
    let file = loaded.config.clone().unwrap_or_default();
    let config_dir = loaded.path.as_deref().and_then(Path::parent);

    let cache_location = if let Some(path) = args.cache_path.clone() {
        CacheLocation::new(path)
    } else if let Some(path) = file.cache_path {
        match config_dir {
            Some(dir) if path.is_relative() => CacheLocation::new(dir.join(path)),
            _ => CacheLocation::new(path),
        }
    } else {
        CacheLocation::default_location().context("Failed to resolve auth cache location")?
    };

    Ok(Settings {
        cache_location,
        max_age_hours: args
            .max_age_hours
            .or(file.max_age_hours)
            .unwrap_or(DEFAULT_MAX_AGE_HOURS),
        target_url: file
            .notebooklm_url
            .unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "cache_path" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `cache_path` value on line {}", line_index + 1)
                })?;
                cfg.cache_path = Some(PathBuf::from(parsed));
            }
            "max_age_hours" => {
                let parsed = parse_number(value).with_context(|| {
                    format!("Invalid `max_age_hours` value on line {}", line_index + 1)
                })?;
                cfg.max_age_hours = Some(parsed);
            }
            "notebooklm_url" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `notebooklm_url` value on line {}", line_index + 1)
                })?;
                cfg.notebooklm_url = Some(parsed);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_number(raw_value: &str) -> Result<f64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected numeric value");
    }
    Ok(token.parse::<f64>()?)
}
