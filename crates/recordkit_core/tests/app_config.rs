use recordkit_core::config::DEFAULT_CONFIG_FILE_NAME;
use recordkit_core::{AppConfig, AppConfigError};
use std::collections::BTreeMap;
use std::fs;

fn defaults() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("page_size".to_string(), "25".to_string()),
        ("theme".to_string(), "light".to_string()),
    ])
}

#[test]
fn missing_file_falls_back_to_defaults_and_is_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());

    config.load().unwrap();

    assert_eq!(config.property("page_size"), Some("25"));
    assert_eq!(
        config.file(),
        dir.path().join(DEFAULT_CONFIG_FILE_NAME).as_path()
    );
    let written = fs::read_to_string(config.file()).unwrap();
    assert!(written.starts_with("# Configuration file for Billing"));
    assert!(written.contains("theme=light"));
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("billing.properties"),
        "# user settings\ntheme=dark\nextra_flag=yes\n",
    )
    .unwrap();
    let mut config = AppConfig::new(
        "Billing",
        Some("billing.properties"),
        Some(dir.path()),
        defaults(),
    );

    config.load().unwrap();

    assert_eq!(config.property("theme"), Some("dark"));
    assert_eq!(config.property("THEME"), Some("dark"));
    assert_eq!(config.property("page_size"), Some("25"));

    let session = config.session_config();
    assert!(session.flag("extra_flag"));
    assert_eq!(session.get("page_size"), Some("25"));
}

#[test]
fn set_property_persists_through_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());
    config.set_property("Last_Export", "2024-05-01").unwrap();
    config.save().unwrap();

    let mut reloaded = AppConfig::new("Billing", None, Some(dir.path()), BTreeMap::new());
    reloaded.load().unwrap();
    assert_eq!(reloaded.property("last_export"), Some("2024-05-01"));
    assert_eq!(reloaded.property("theme"), Some("light"));
}

#[test]
fn dotted_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), BTreeMap::new());

    assert!(matches!(
        config.set_property("db.path", "/tmp/x"),
        Err(AppConfigError::InvalidKey(_))
    ));
}

#[test]
fn stray_lines_are_skipped_without_losing_user_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
    fs::write(&path, "theme=dark\nuser_token=abc123\njust a note line\n").unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());

    config.load().unwrap();

    assert_eq!(config.property("theme"), Some("dark"));
    assert_eq!(config.property("user_token"), Some("abc123"));
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("user_token=abc123"));
    assert!(!written.contains("just a note line"));
}

#[test]
fn section_headers_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
    fs::write(&path, "theme=dark\n[db]\ndb_path=/srv/billing.db\n").unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());

    config.load().unwrap();

    assert_eq!(config.property("theme"), Some("dark"));
    assert_eq!(config.property("db_path"), Some("/srv/billing.db"));
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("db_path=/srv/billing.db"));
}

#[test]
fn unparseable_file_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE_NAME);
    let original = "theme=\"dark\nuser_token=abc123\n";
    fs::write(&path, original).unwrap();
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());

    config.load().unwrap();

    assert_eq!(config.property("theme"), Some("light"));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn quotes_and_comment_chars_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let greeting = r#""hi" ; it's #1 at C:\data"#;
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());
    config.set_property("greeting", greeting).unwrap();
    config.save().unwrap();

    let mut reloaded = AppConfig::new("Billing", None, Some(dir.path()), BTreeMap::new());
    reloaded.load().unwrap();

    assert_eq!(reloaded.property("greeting"), Some(greeting));
}

// Only this test reads `report_title`; each tests/ file runs in its own process.
#[test]
fn environment_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE_NAME),
        "report_title=From file\n",
    )
    .unwrap();
    std::env::set_var("RECORDKIT_REPORT_TITLE", "From env");
    let mut config = AppConfig::new("Billing", None, Some(dir.path()), defaults());

    let loaded = config.load();
    std::env::remove_var("RECORDKIT_REPORT_TITLE");
    loaded.unwrap();

    assert_eq!(config.property("report_title"), Some("From env"));
    assert_eq!(config.property("theme"), Some("light"));
}
