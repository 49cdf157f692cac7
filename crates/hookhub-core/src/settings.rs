//! Settings for hookhub.
//!
//! [`Settings`] holds the handful of knobs the template engine and logging
//! need. Every field has a default so partial configuration files work.

use serde::{Deserialize, Serialize};

/// Default limit on nested `config.*` indirection.
pub const DEFAULT_MAX_CONFIG_DEPTH: usize = 32;

/// The complete set of hookhub settings.
///
/// # Examples
///
/// ```
/// use hookhub_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert_eq!(settings.max_config_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty, verbose logging).
    pub debug: bool,
    /// The log filter directive (e.g. "info", "hookhub_template=debug").
    pub log_level: String,
    /// How deep `config.*` references may nest before rendering fails.
    pub max_config_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            max_config_depth: DEFAULT_MAX_CONFIG_DEPTH,
        }
    }
}
