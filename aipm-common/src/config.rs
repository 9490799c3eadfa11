//! Configuration resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file (`~/.config/aipm/planner.toml`)
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use std::path::PathBuf;
use tracing::warn;

/// Default configuration file path for the platform
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("aipm").join("planner.toml"))
        .unwrap_or_else(|| PathBuf::from("planner.toml"))
}

/// Load the TOML config file as a generic table, if present.
///
/// A missing file is not an error; a file that fails to parse is, so that
/// typos do not silently fall through to defaults.
pub fn load_config_table() -> Result<Option<toml::Table>> {
    let path = config_file_path();
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };
    let table = content
        .parse::<toml::Table>()
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(Some(table))
}

/// Resolve a string setting: ENV -> TOML -> default.
pub fn resolve_setting(
    env_var: &str,
    toml_table: Option<&toml::Table>,
    toml_key: &str,
    default: &str,
) -> String {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return value;
        }
    }

    if let Some(table) = toml_table {
        if let Some(value) = table.get(toml_key).and_then(|v| v.as_str()) {
            if !value.trim().is_empty() {
                return value.to_string();
            }
        }
    }

    default.to_string()
}

/// Resolve a required secret: ENV -> TOML, with no default.
///
/// Warns when the secret is present in more than one source (potential
/// misconfiguration). The returned error carries remediation hints.
pub fn resolve_secret(
    env_var: &str,
    toml_table: Option<&toml::Table>,
    toml_key: &str,
    description: &str,
) -> Result<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_table
        .and_then(|t| t.get(toml_key))
        .and_then(|v| v.as_str())
        .filter(|v| is_valid_key(v))
        .map(|v| v.to_string());

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            description
        );
    }

    env_value.or(toml_value).ok_or_else(|| {
        Error::Config(format!(
            "{} not configured. Please configure using one of:\n\
             1. Environment: {}=your-key-here\n\
             2. TOML config: {} ({} = \"your-key\")",
            description,
            env_var,
            config_file_path().display(),
            toml_key
        ))
    })
}

/// Validate a key value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
