use super::*;

use std::io::Write as _;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&dir.path().join("absent.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.notification_dismiss(), Duration::from_millis(1000));
}

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "controller_url = \"http://rig.local\"\nrequest_timeout_ms = 2500\nnotification_dismiss_ms = \"400\"\npresets_path = \"/api/presets\""
    )
    .expect("write");

    let settings = load_settings_from(file.path(), no_env);
    assert_eq!(settings.controller_url, "http://rig.local");
    assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
    assert_eq!(settings.notification_dismiss_ms, 400);
    assert_eq!(settings.presets_path, "/api/presets");
    assert_eq!(settings.scan_path, "/bluetooth/scan");
}

#[test]
fn env_overrides_file_and_prefixed_name_wins() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "controller_url = \"http://from-file\"").expect("write");

    let env = |key: &str| match key {
        "CONTROLLER_URL" => Some("http://plain".to_string()),
        "APP__CONTROLLER_URL" => Some("http://prefixed".to_string()),
        "APP__REQUEST_TIMEOUT_MS" => Some("not-a-number".to_string()),
        "APP__STOP_SCAN_PATH" => Some("/bt/stop".to_string()),
        _ => None,
    };

    let settings = load_settings_from(file.path(), env);
    assert_eq!(settings.controller_url, "http://prefixed");
    assert_eq!(settings.request_timeout_ms, 10_000);
    assert_eq!(settings.stop_scan_path, "/bt/stop");
}

#[test]
fn unparsable_file_is_ignored() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "controller_url = = broken").expect("write");

    let settings = load_settings_from(file.path(), no_env);
    assert_eq!(settings, Settings::default());
}
