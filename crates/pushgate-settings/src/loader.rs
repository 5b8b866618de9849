//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use pushgate_core::Environment;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{GatewaySettings, pushgate_home};

/// Resolve the path to the settings file (`~/.pushgate/settings.json`).
pub fn settings_path() -> PathBuf {
    pushgate_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<GatewaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<GatewaySettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with the settings file merged on top; no env overrides.
pub fn load_file_layer(path: &Path) -> Result<GatewaySettings> {
    let defaults = serde_json::to_value(GatewaySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PUSHGATE_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut GatewaySettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Empty values are treated as unset. Values that fail to parse are ignored
/// with a warning and the file/default value stays.
pub fn apply_overrides(settings: &mut GatewaySettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("PUSHGATE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("PUSHGATE_PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.server.port = port,
            None => warn!(key = "PUSHGATE_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }

    // ── Storage / logging ───────────────────────────────────────────
    if let Some(v) = read("PUSHGATE_DB_PATH") {
        settings.storage.db_path = Some(v);
    }
    if let Some(v) = read("PUSHGATE_LOG_LEVEL") {
        settings.logging.level = v;
    }

    // ── APNs ────────────────────────────────────────────────────────
    if let Some(v) = read("PUSHGATE_APNS_ENV") {
        match v.parse::<Environment>() {
            Ok(env) => settings.apns.environment = env,
            Err(_) => warn!(key = "PUSHGATE_APNS_ENV", value = %v, "invalid environment env var, ignoring"),
        }
    }
    if let Some(v) = read("PUSHGATE_APNS_TEAM_ID") {
        settings.apns.team_id = v;
    }
    if let Some(v) = read("PUSHGATE_APNS_KEY_ID") {
        settings.apns.key_id = v;
    }
    if let Some(v) = read("PUSHGATE_APNS_BUNDLE_ID") {
        settings.apns.bundle_id = v;
    }
    if let Some(v) = read("PUSHGATE_APNS_KEY_PATH") {
        settings.apns.key_path = Some(v);
    }

    // ── Auth ────────────────────────────────────────────────────────
    if let Some(v) = read("PUSHGATE_AUTH_USER") {
        settings.auth.username = v;
    }
    if let Some(v) = read("PUSHGATE_AUTH_PASS") {
        settings.auth.password = v;
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8080, "host": "localhost"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9443}, "apns": {"teamId": "TEAM"}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.server.port, 9443);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.apns.team_id, "TEAM");
        assert_eq!(settings.apns.request_timeout_secs, 15);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();
        assert!(matches!(
            load_file_layer(&path).unwrap_err(),
            SettingsError::Json(_)
        ));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply() {
        let mut settings = GatewaySettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("PUSHGATE_PORT", "9000"),
                ("PUSHGATE_APNS_ENV", "production"),
                ("PUSHGATE_APNS_TEAM_ID", "T"),
                ("PUSHGATE_AUTH_USER", "admin"),
                ("PUSHGATE_DB_PATH", "/tmp/x.db"),
            ]),
        );
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.apns.environment, Environment::Production);
        assert_eq!(settings.apns.team_id, "T");
        assert_eq!(settings.auth.username, "admin");
        assert_eq!(settings.storage.db_path.as_deref(), Some("/tmp/x.db"));
    }

    #[test]
    fn invalid_overrides_ignored() {
        let mut settings = GatewaySettings::default();
        apply_overrides(
            &mut settings,
            env(&[("PUSHGATE_PORT", "99999"), ("PUSHGATE_APNS_ENV", "staging")]),
        );
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.apns.environment, Environment::Sandbox);
    }

    #[test]
    fn empty_override_treated_as_unset() {
        let mut settings = GatewaySettings::default();
        apply_overrides(&mut settings, env(&[("PUSHGATE_HOST", "")]));
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn parse_u16_range_bounds() {
        assert_eq!(parse_u16_range("1", 1, 65535), Some(1));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }
}
