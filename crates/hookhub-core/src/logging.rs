//! Logging integration for hookhub.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-render spans.

use crate::settings::Settings;

/// Crates whose events a bare `log_level` applies to.
pub const HOOKHUB_TARGETS: [&str; 3] = ["hookhub", "hookhub_core", "hookhub_template"];

/// Level for every other crate when `log_level` is a bare level.
const OTHER_CRATES_LEVEL: &str = "warn";

/// Expands `log_level` into filter directives.
///
/// A bare level such as `"debug"` is scoped to the hookhub crates, with other
/// crates held at `warn`. Anything containing `=` or `,` is taken as a full
/// directive list and passed through unchanged.
///
/// # Examples
///
/// ```
/// use hookhub_core::logging::filter_directives;
///
/// assert_eq!(
///     filter_directives("debug"),
///     "warn,hookhub=debug,hookhub_core=debug,hookhub_template=debug"
/// );
/// assert_eq!(filter_directives("hookhub_template=trace"), "hookhub_template=trace");
/// ```
pub fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };

    let mut directives = OTHER_CRATES_LEVEL.to_string();
    for target in HOOKHUB_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is built from `settings.log_level` by [`filter_directives`];
/// an invalid filter falls back to `info` for the hookhub crates. In debug
/// mode a pretty, human-readable format is used; otherwise a structured JSON
/// format is used.
/// Installing twice is harmless: the second call is ignored.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter_directives(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one template render.
///
/// `depth` is 0 for a top-level render and grows by one for every nested
/// `config.*` indirection, so nested diagnostics can be told apart.
///
/// # Examples
///
/// ```
/// use hookhub_core::logging::render_span;
///
/// let span = render_span(0);
/// let _guard = span.enter();
/// tracing::debug!("rendering");
/// ```
pub fn render_span(depth: usize) -> tracing::Span {
    tracing::debug_span!("render", depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_is_scoped_to_hookhub_crates() {
        assert_eq!(
            filter_directives("info"),
            "warn,hookhub=info,hookhub_core=info,hookhub_template=info"
        );
        assert_eq!(
            filter_directives(" trace "),
            "warn,hookhub=trace,hookhub_core=trace,hookhub_template=trace"
        );
        assert_eq!(
            filter_directives(""),
            "warn,hookhub=info,hookhub_core=info,hookhub_template=info"
        );
    }

    #[test]
    fn test_directive_lists_pass_through() {
        assert_eq!(filter_directives("hookhub_template=debug"), "hookhub_template=debug");
        assert_eq!(filter_directives("info,regex=off"), "info,regex=off");
    }

    #[test]
    fn test_expanded_filters_parse() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            assert!(tracing_subscriber::EnvFilter::try_new(filter_directives(level)).is_ok());
        }
    }

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings::default();
        setup_logging(&settings);
        setup_logging(&settings);
    }
}
