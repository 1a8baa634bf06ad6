use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "rigctl.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub controller_url: String,
    pub request_timeout_ms: u64,
    pub notification_dismiss_ms: u64,
    pub presets_path: String,
    pub scan_path: String,
    pub stop_scan_path: String,
    pub home_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controller_url: "http://127.0.0.1:5000".into(),
            request_timeout_ms: 10_000,
            notification_dismiss_ms: 1_000,
            presets_path: "/presets".into(),
            scan_path: "/bluetooth/scan".into(),
            stop_scan_path: "/bluetooth/stop-scan".into(),
            home_path: "/home".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notification_dismiss(&self) -> Duration {
        Duration::from_millis(self.notification_dismiss_ms)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if it exists, then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    match read_settings_file(path) {
        Ok(Some(file_cfg)) => apply_file(&mut settings, &file_cfg),
        Ok(None) => {}
        Err(err) => warn!("ignoring settings file: {err:#}"),
    }

    apply_env(&mut settings, env);
    settings
}

fn read_settings_file(path: &Path) -> anyhow::Result<Option<HashMap<String, toml::Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let parsed = toml::from_str(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    let text = |key: &str| file_cfg.get(key).and_then(toml::Value::as_str).map(str::to_string);
    let millis = |key: &str| match file_cfg.get(key) {
        Some(toml::Value::Integer(v)) => u64::try_from(*v).ok(),
        Some(toml::Value::String(v)) => v.parse().ok(),
        _ => None,
    };

    if let Some(v) = text("controller_url") {
        settings.controller_url = v;
    }
    if let Some(v) = millis("request_timeout_ms") {
        settings.request_timeout_ms = v;
    }
    if let Some(v) = millis("notification_dismiss_ms") {
        settings.notification_dismiss_ms = v;
    }
    if let Some(v) = text("presets_path") {
        settings.presets_path = v;
    }
    if let Some(v) = text("scan_path") {
        settings.scan_path = v;
    }
    if let Some(v) = text("stop_scan_path") {
        settings.stop_scan_path = v;
    }
    if let Some(v) = text("home_path") {
        settings.home_path = v;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CONTROLLER_URL") {
        settings.controller_url = v;
    }
    if let Some(v) = env("APP__CONTROLLER_URL") {
        settings.controller_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_ms = parsed;
        }
    }
    if let Some(v) = env("APP__NOTIFICATION_DISMISS_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notification_dismiss_ms = parsed;
        }
    }

    if let Some(v) = env("APP__PRESETS_PATH") {
        settings.presets_path = v;
    }
    if let Some(v) = env("APP__SCAN_PATH") {
        settings.scan_path = v;
    }
    if let Some(v) = env("APP__STOP_SCAN_PATH") {
        settings.stop_scan_path = v;
    }
    if let Some(v) = env("APP__HOME_PATH") {
        settings.home_path = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
