//! Integration tests for settings serialization and their effect on rendering.

use bson::{Bson, DateTime};
use storeview::state::{ConfigManager, RenderSettings, ViewerSettings};
use storeview::value::{DEFAULT_DATE_FORMAT, DateZone, Rendered, ValueRenderer};
use tempfile::TempDir;

// =============================================================================
// Defaults and partial files
// =============================================================================

#[test]
fn test_default_settings() {
    let settings = ViewerSettings::default();
    assert_eq!(settings.rendering.date_format, DEFAULT_DATE_FORMAT);
}

#[test]
fn test_partial_settings_fill_defaults() {
    let settings: ViewerSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, ViewerSettings::default());

    let settings: ViewerSettings = serde_json::from_str(r#"{"rendering": {}}"#).unwrap();
    assert_eq!(settings.rendering.date_format, DEFAULT_DATE_FORMAT);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let json = r#"{"rendering": {"date_format": "%Y"}, "theme": "dark"}"#;
    let settings: ViewerSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.rendering.date_format, "%Y");
}

// =============================================================================
// Date format validation
// =============================================================================

#[test]
fn test_set_date_format_rejects_bad_patterns() {
    let mut rendering = RenderSettings::default();
    assert!(rendering.set_date_format("").is_err());
    assert!(rendering.set_date_format("%Q").is_err());
    assert_eq!(rendering.date_format, DEFAULT_DATE_FORMAT);

    rendering.set_date_format("%d.%m.%Y").unwrap();
    assert_eq!(rendering.date_format, "%d.%m.%Y");
}

// =============================================================================
// Round trip through ConfigManager
// =============================================================================

#[test]
fn test_saved_format_drives_renderer() {
    let dir = TempDir::new().unwrap();
    let config = ConfigManager::with_config_dir(dir.path().to_path_buf()).unwrap();

    let mut settings = config.load_settings().unwrap();
    settings.rendering.set_date_format("%d/%m/%Y").unwrap();
    settings.rendering.time_zone = DateZone::Utc;
    config.save_settings(&settings).unwrap();

    let loaded = config.load_settings().unwrap();
    let renderer = ValueRenderer::from_settings(&loaded.rendering);
    assert_eq!(renderer.zone(), DateZone::Utc);
    let late = Bson::DateTime(DateTime::from_millis(1_710_374_400_000 + 23 * 3_600_000));
    assert_eq!(renderer.render(&late), Rendered::Leaf("14/03/2024".to_string()));
}

#[test]
fn test_missing_time_zone_defaults_to_local() {
    let json = r#"{"rendering": {"date_format": "%Y"}}"#;
    let settings: ViewerSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.rendering.time_zone, DateZone::Local);
    assert_eq!(ValueRenderer::from_settings(&settings.rendering).zone(), DateZone::Local);
}
