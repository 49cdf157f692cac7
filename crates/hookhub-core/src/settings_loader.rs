//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (fields present in the file win).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `HOOKHUB_DEBUG` | `debug` |
//! | `HOOKHUB_LOG_LEVEL` | `log_level` |
//! | `HOOKHUB_MAX_CONFIG_DEPTH` | `max_config_depth` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use hookhub_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/hookhub.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::HookhubError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, HookhubError> {
    toml::from_str(toml_str)
        .map_err(|e| HookhubError::ConfigurationError(format!("Failed to parse TOML: {e}")))
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, HookhubError> {
    let content = read_config_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, HookhubError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, HookhubError> {
    serde_json::from_str(json_str)
        .map_err(|e| HookhubError::ConfigurationError(format!("Failed to parse JSON: {e}")))
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, HookhubError> {
    let content = read_config_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// - `HOOKHUB_DEBUG` -> `debug` ("true"/"1"/"yes" => true, anything else => false)
/// - `HOOKHUB_LOG_LEVEL` -> `log_level`
/// - `HOOKHUB_MAX_CONFIG_DEPTH` -> `max_config_depth` (ignored unless a positive integer)
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("HOOKHUB_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("HOOKHUB_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("HOOKHUB_MAX_CONFIG_DEPTH") {
        match val.trim().parse::<usize>() {
            Ok(depth) if depth > 0 => settings.max_config_depth = depth,
            _ => tracing::warn!(value = %val, "ignoring invalid HOOKHUB_MAX_CONFIG_DEPTH"),
        }
    }
}

fn read_config_file(path: &Path, format: &str) -> Result<String, HookhubError> {
    std::fs::read_to_string(path).map_err(|e| {
        HookhubError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}
