use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::sync::suggestion::DEFAULT_QUIESCENCE;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CONFIG_DIR_NAME: &str = "ticket-desk";
const CONFIG_FILE_NAME: &str = "config.json";

const ENV_API_URL: &str = "TICKET_DESK_API_URL";
const ENV_DEBOUNCE_MS: &str = "TICKET_DESK_DEBOUNCE_MS";
const ENV_TIMEOUT_SECS: &str = "TICKET_DESK_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub debounce: Duration,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            debounce: DEFAULT_QUIESCENCE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Defaults, then the stored config file, then environment variables.
    pub fn load() -> AppResult<Self> {
        let stored = match config_file_path() {
            Ok(path) => StoredConfig::load_from(&path)?,
            Err(_) => StoredConfig::default(),
        };
        Self::resolve(&stored, |key| env::var(key).ok())
    }

    pub fn resolve(
        stored: &StoredConfig,
        env_var: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(url) = non_empty(stored.api_base_url.as_deref()) {
            config.api_base_url = url.to_string();
        }
        if let Some(ms) = stored.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = stored.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(url) = env_var(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(ms) = env_var(ENV_DEBOUNCE_MS) {
            config.debounce = Duration::from_millis(parse_number(ENV_DEBOUNCE_MS, &ms)?);
        }
        if let Some(secs) = env_var(ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &secs)?);
        }

        Ok(config)
    }
}

/// Settings persisted by `config init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Platform config directory (`$XDG_CONFIG_HOME` or `~/.config` on Linux,
/// `Application Support` on macOS, `%APPDATA%` on Windows).
pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("cannot locate a configuration directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(key: &str, value: &str) -> AppResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Configuration(format!("{key} must be a whole number, got '{value}'")))
}
