//! Operating settings loaded from `prodline.toml`.
//!
//! Values missing from the file use defaults. The environment variables
//! `PRODLINE_LIVE` and `PRODLINE_CONFIG_ID` take precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LineError, LineResult};

pub const LIVE_ENV: &str = "PRODLINE_LIVE";
pub const CONFIG_ID_ENV: &str = "PRODLINE_CONFIG_ID";

/// Process-wide settings for running a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// Which stored line configuration to load.
    #[serde(default = "default_config_id")]
    pub config_id: String,

    /// Live production: destructive administrative operations are refused.
    #[serde(default)]
    pub live: bool,

    /// Root directory of the file-backed store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_config_id() -> String {
    "default".to_string()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".prodline")
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            config_id: default_config_id(),
            live: false,
            data_dir: default_data_dir(),
        }
    }
}

impl LineSettings {
    /// Load settings from `path`, falling back to defaults if it does not
    /// exist, then apply overrides from the process environment.
    pub fn load(path: impl AsRef<Path>) -> LineResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`LineSettings::load`], with overrides read through `lookup`.
    pub fn load_with(path: impl AsRef<Path>, lookup: impl Fn(&str) -> Option<String>) -> LineResult<Self> {
        let path = path.as_ref();
        let settings = if path.exists() {
            debug!("Reading settings from {:?}", path);
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        settings.with_env_overrides(lookup)
    }

    pub fn from_toml(content: &str) -> LineResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides read through `lookup`.
    ///
    /// An unrecognised `PRODLINE_LIVE` value is an error rather than "off".
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> LineResult<Self> {
        if let Some(live) = lookup(LIVE_ENV) {
            self.live = parse_flag(&live).ok_or_else(|| LineError::InvalidSetting {
                key: LIVE_ENV.to_string(),
                value: live.clone(),
            })?;
        }
        if let Some(config_id) = lookup(CONFIG_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.config_id = config_id;
        }
        Ok(self)
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = config_id.into();
        self
    }

    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
