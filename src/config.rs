//! Application-level configuration loading: default scoring rules, reset
//! policy and where the match document is stored.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    engine::ResetPolicy,
    model::{DEFAULT_TARGET_POINTS, Settings, clamp_target_points},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BADMINTON_SCOREBOARD_CONFIG_PATH";
/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "badminton-scoreboard/v1";
/// Directory for the file store when none is configured.
const DEFAULT_DATA_DIR: &str = "data";
/// Columns per score-sheet page when the client does not ask for a width.
const DEFAULT_SHEET_COLUMNS: usize = 10;

/// Where the match document lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// JSON file under `path`, named after `key`.
    File {
        /// Directory holding the slot file.
        #[serde(default = "default_data_dir")]
        path: PathBuf,
        /// Storage key.
        #[serde(default = "default_storage_key")]
        key: String,
    },
    /// Process memory only.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: default_data_dir(),
            key: default_storage_key(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.into()
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Rules used for a fresh match and after a full reset.
    pub settings: Settings,
    /// What a full reset keeps.
    pub reset_policy: ResetPolicy,
    /// Storage backend.
    pub storage: StorageConfig,
    /// Default page width of printed score sheets.
    pub sheet_page_columns: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        target_points = app_config.settings.target_points,
                        reset_policy = ?app_config.reset_policy,
                        "loaded scoreboard config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            reset_policy: ResetPolicy::default(),
            storage: StorageConfig::default(),
            sheet_page_columns: DEFAULT_SHEET_COLUMNS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    settings: RawSettings,
    #[serde(default)]
    reset_policy: ResetPolicy,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    sheet_page_columns: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Default scoring rules inside the configuration file.
struct RawSettings {
    target_points: Option<u32>,
    allow_deuce: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let settings = Settings {
            target_points: clamp_target_points(
                value.settings.target_points.unwrap_or(DEFAULT_TARGET_POINTS),
            ),
            allow_deuce: value.settings.allow_deuce.unwrap_or(true),
            cumulative: false,
        };
        Self {
            settings,
            reset_policy: value.reset_policy,
            storage: value.storage,
            sheet_page_columns: value
                .sheet_page_columns
                .filter(|columns| *columns > 0)
                .unwrap_or(DEFAULT_SHEET_COLUMNS),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.reset_policy, ResetPolicy::KeepRoster);
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.sheet_page_columns, 10);
    }

    #[test]
    fn full_document_is_honoured() {
        let config = AppConfig::from_json(
            r#"{
                "settings": { "targetPoints": 15, "allowDeuce": false },
                "reset_policy": "keep_assigned_names",
                "storage": { "kind": "file", "path": "/srv/scoreboard", "key": "court-2" },
                "sheet_page_columns": 16
            }"#,
        )
        .unwrap();
        assert_eq!(config.settings.target_points, 15);
        assert!(!config.settings.allow_deuce);
        assert_eq!(config.reset_policy, ResetPolicy::KeepAssignedNames);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                path: PathBuf::from("/srv/scoreboard"),
                key: "court-2".into()
            }
        );
        assert_eq!(config.sheet_page_columns, 16);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let config = AppConfig::from_json(
            r#"{ "settings": { "targetPoints": 0 }, "storage": { "kind": "file" }, "sheet_page_columns": 0 }"#,
        )
        .unwrap();
        assert_eq!(config.settings.target_points, DEFAULT_TARGET_POINTS);
        assert_eq!(config.sheet_page_columns, 10);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                path: PathBuf::from("data"),
                key: DEFAULT_STORAGE_KEY.into()
            }
        );
    }

    #[test]
    fn unknown_storage_kind_is_rejected() {
        assert!(AppConfig::from_json(r#"{ "storage": { "kind": "postgres", "key": "court-2" } }"#).is_err());
        let config = AppConfig::from_json(r#"{ "storage": { "kind": "memory" } }"#).unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
    }
}
