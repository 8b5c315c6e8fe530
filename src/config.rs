//! Configuration file parsing for zm-event-hook.
//!
//! Reads configuration from `/etc/zm/zm-event-hook.toml` (or the path given
//! with `--config` / `ZM_EVENT_HOOK_CONFIG`) and provides defaults for
//! missing fields.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zm/zm-event-hook.toml";

/// Env var overriding the configuration file path.
pub const CONFIG_ENV: &str = "ZM_EVENT_HOOK_CONFIG";

/// Env var overriding the alarm state file path.
pub const ALARM_STATE_ENV: &str = "ZM_EVENT_HOOK_ALARM_STATE";

/// Where the shared alarm flag lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// One-character file written by the alarm watchdog ("0" or "1")
    pub alarm_state_file: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            alarm_state_file: PathBuf::from("/etc/alarm-status-server/alarm_state"),
        }
    }
}

/// Which rule permutation to evaluate events with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// Cause keywords first (ALARM, DOOR BELL, Motion), then person
    /// detection. The alarm counts as armed unless the state file holds `0`.
    #[default]
    Layered,
    /// Only person detection, alarm state and night time count. The alarm
    /// is armed only when the state file holds exactly `1`.
    PersonOnly,
}

/// Tunables for the interestingness rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub rule_set: RuleSet,
    /// Monitor ID of the camera facing the front of the house
    pub front_monitor_id: String,
    /// Whether a DOOR BELL cause keeps the event
    pub door_bell_interesting: bool,
    /// Keep every person detection on the front monitor, regardless of time
    pub front_always_interesting: bool,
    /// First hour (inclusive) of the night window
    pub night_start_hour: u32,
    /// Last hour (exclusive) of the night window
    pub night_end_hour: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rule_set: RuleSet::Layered,
            front_monitor_id: "8".to_string(),
            door_bell_interesting: false,
            front_always_interesting: false,
            night_start_hour: 0,
            night_end_hour: 6,
        }
    }
}

/// ZoneMinder API connection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base API URL, e.g. `https://host/zm/api`
    pub api_portal: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub basic_user: Option<String>,
    pub basic_password: Option<String>,
    /// Accept self-signed TLS certificates
    pub allow_self_signed: bool,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_portal: "https://localhost/zm/api".to_string(),
            user: None,
            password: None,
            basic_user: None,
            basic_password: None,
            allow_self_signed: false,
            timeout_secs: 30,
        }
    }
}

// Passwords stay out of debug logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ApiConfig")
            .field("api_portal", &self.api_portal)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("basic_user", &self.basic_user)
            .field("basic_password", &redact(&self.basic_password))
            .field("allow_self_signed", &self.allow_self_signed)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Push notification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// JSON file holding the Pushover token, user key and sound
    pub pushover_file: PathBuf,
    pub endpoint: String,
    pub title: String,
    pub front_message: String,
    pub back_message: String,
    pub priority: i32,
    /// Snapshot file name inside the event directory
    pub snapshot_file: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pushover_file: PathBuf::from("/etc/zm/pushover.json"),
            endpoint: "https://api.pushover.net/1/messages.json".to_string(),
            title: "NOTIS".to_string(),
            front_message: "Någon rör sig på framsidan".to_string(),
            back_message: "Någon rör sig på baksidan".to_string(),
            priority: 0,
            snapshot_file: "objdetect.jpg".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Main configuration struct for zm-event-hook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub state: StateConfig,
    pub rules: RulesConfig,
    pub api: ApiConfig,
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from the resolved config path.
    ///
    /// - If the file doesn't exist, returns default configuration.
    /// - If the file contains invalid TOML, logs a warning and returns default.
    /// - If some fields are missing, uses defaults for those fields.
    ///
    /// `ZM_EVENT_HOOK_ALARM_STATE` overrides `state.alarm_state_file` afterwards.
    pub fn load(explicit: Option<&Path>) -> Config {
        let config_path = Self::config_path(explicit);
        let mut config = Self::load_file(&config_path);

        if let Ok(path) = std::env::var(ALARM_STATE_ENV) {
            config.state.alarm_state_file = PathBuf::from(path);
        }

        config
    }

    fn load_file(config_path: &Path) -> Config {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Config::default();
        }

        match fs::read_to_string(config_path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Invalid TOML in config file, using default config"
                );
                Config::default()
            }),
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Could not read config file, using default config"
                );
                Config::default()
            }
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// Missing fields will use their default values due to `#[serde(default)]`.
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        Ok(config)
    }

    /// Resolves the config file path: explicit flag, then
    /// `ZM_EVENT_HOOK_CONFIG`, then `/etc/zm/zm-event-hook.toml`.
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(
            config.state.alarm_state_file,
            PathBuf::from("/etc/alarm-status-server/alarm_state")
        );
        assert_eq!(config.rules.rule_set, RuleSet::Layered);
        assert_eq!(config.rules.front_monitor_id, "8");
        assert!(!config.rules.door_bell_interesting);
        assert_eq!(config.rules.night_start_hour, 0);
        assert_eq!(config.rules.night_end_hour, 6);
        assert_eq!(config.notify.title, "NOTIS");
        assert_eq!(config.notify.snapshot_file, "objdetect.jpg");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [state]
            alarm_state_file = "/etc/alarm-watchdog/alarm_state"

            [rules]
            rule_set = "person_only"
            front_monitor_id = "3"
            door_bell_interesting = true
            night_start_hour = 22
            night_end_hour = 5

            [api]
            api_portal = "https://cam.example/zm/api"
            user = "admin"
            password = "secret"
            allow_self_signed = true
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(
            config.state.alarm_state_file,
            PathBuf::from("/etc/alarm-watchdog/alarm_state")
        );
        assert_eq!(config.rules.rule_set, RuleSet::PersonOnly);
        assert_eq!(config.rules.front_monitor_id, "3");
        assert!(config.rules.door_bell_interesting);
        assert_eq!(config.rules.night_start_hour, 22);
        assert_eq!(config.rules.night_end_hour, 5);
        assert_eq!(config.api.api_portal, "https://cam.example/zm/api");
        assert_eq!(config.api.user.as_deref(), Some("admin"));
        assert!(config.api.allow_self_signed);
    }

    #[test]
    fn test_config_invalid_toml_uses_defaults() {
        let result = Config::from_toml("invalid { toml [");
        assert!(result.is_err());
        let config = result.unwrap_or_default();
        assert_eq!(config.rules.front_monitor_id, "8");
    }

    #[test]
    fn test_config_unknown_rule_set_is_error() {
        let toml = r#"
            [rules]
            rule_set = "everything"
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_config_partial_toml_uses_defaults_for_missing() {
        let toml = r#"
            [notify]
            title = "LARM"
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.notify.title, "LARM");
        assert_eq!(config.notify.front_message, "Någon rör sig på framsidan");
        assert_eq!(config.notify.priority, 0);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.rules.front_monitor_id, "8");
        assert!(config.notify.enabled);
    }

    #[test]
    fn test_config_path_prefers_explicit() {
        let path = Config::config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_load_file_missing_returns_defaults() {
        let config = Config::load_file(Path::new("/this/path/does/not/exist.toml"));
        assert_eq!(config.rules.front_monitor_id, "8");
    }

    #[test]
    fn test_load_file_reads_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[rules]\nfront_monitor_id = \"12\"").unwrap();
        let config = Config::load_file(file.path());
        assert_eq!(config.rules.front_monitor_id, "12");
    }

    #[test]
    fn test_load_file_invalid_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[rules\nbroken").unwrap();
        let config = Config::load_file(file.path());
        assert_eq!(config.rules.front_monitor_id, "8");
    }

    #[test]
    fn test_api_only_needs_api_portal() {
        let toml = r#"
            [api]
            api_portal = "https://cam.example/zm/api"
            portal = "https://cam.example/zm"
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.api.api_portal, "https://cam.example/zm/api");
        assert!(!format!("{:?}", config.api).contains("cam.example/zm\""));
    }

    #[test]
    fn test_api_debug_redacts_passwords() {
        let api = ApiConfig {
            password: Some("hunter2".to_string()),
            basic_password: Some("letmein".to_string()),
            ..ApiConfig::default()
        };
        let out = format!("{:?}", api);
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("letmein"));
        assert!(out.contains("***"));
    }
}
