//! Integration tests for the `hookhub` facade crate.
//!
//! Tests cover: rendering through the convenience function, the re-exported
//! JSON and tracing crates, and logging setup.

use hookhub::serde_json::json;
use hookhub::{Engine, Settings, Value};

// ═════════════════════════════════════════════════════════════════════
// 1. Rendering through the facade
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_render_convenience_function() {
    let out = hookhub::render("${for i in data.l}$data.l.i${endfor}", json!({"l": ["a", "b"]}), None);
    assert_eq!(out.as_deref(), Some("ab"));
}

#[test]
fn test_engine_from_settings_through_facade() {
    let settings = Settings {
        max_config_depth: 2,
        ..Settings::default()
    };
    let engine = Engine::from_settings(&settings);
    let payload = Value::from(json!({"obj": {"k": "é"}}));
    assert_eq!(engine.render("$data.obj", &payload, None).as_deref(), Some(r#"{"k": "\u00e9"}"#));
}

// ═════════════════════════════════════════════════════════════════════
// 2. Re-exported logging crates
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_tracing_reexports_are_usable() {
    hookhub::init_logging(&Settings::default());
    let span = hookhub::tracing::info_span!("facade");
    let _guard = span.enter();
    hookhub::tracing::info!("rendering through the facade");

    let filter = hookhub::tracing_subscriber::EnvFilter::try_new(
        hookhub::core::logging::filter_directives("debug"),
    );
    assert!(filter.is_ok());
}
