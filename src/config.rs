use directories::ProjectDirs;
use log::{LevelFilter, debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SETTINGS_FILE_NAME: &str = "iiify-settings.json";

/// Configuration for the iiify application loaded from environment variables.
///
/// Supports both IIIFY_* and IA_* prefixes. When both are present, IIIFY_* takes precedence.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level for the application (default: INFO)
    pub log_level: LevelFilter,

    /// Path to the settings file, when overridden from the environment
    pub settings_file: Option<String>,

    /// User agent string for HTTP requests (default: iiify/<version>)
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Info,
            settings_file: None,
            user_agent: format!(
                "iiify/{} ({}-{})",
                env!("CARGO_PKG_VERSION"),
                env::consts::OS,
                env::consts::ARCH
            ),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Checks both IIIFY_* and IA_* prefixes, with IIIFY_* taking precedence.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = Self::get_env_with_fallback("IIIFY_LOG_LEVEL", "IA_LOG_LEVEL") {
            config.log_level = Self::parse_log_level(&level);
        }

        if let Ok(path) = Self::get_env_with_fallback("IIIFY_SETTINGS_FILE", "IA_SETTINGS_FILE") {
            config.settings_file = Some(path);
        }

        if let Ok(ua) = Self::get_env_with_fallback("IIIFY_UA_NAME_VER", "IA_UA_NAME_VER") {
            config.user_agent = ua;
        }

        config
    }

    /// Get environment variable with fallback to alternative name.
    /// Primary takes precedence over fallback.
    fn get_env_with_fallback(primary: &str, fallback: &str) -> Result<String, env::VarError> {
        env::var(primary).or_else(|_| env::var(fallback))
    }

    /// Parse log level string to LevelFilter.
    ///
    /// Supports: TRACE, DEBUG, INFO, WARN, ERROR, OFF (case-insensitive)
    fn parse_log_level(level: &str) -> LevelFilter {
        match level.to_uppercase().as_str() {
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            "OFF" => LevelFilter::Off,
            _ => {
                eprintln!("Warning: Invalid log level '{}', using INFO", level);
                LevelFilter::Info
            }
        }
    }

    /// Where the settings file lives: the environment override if present,
    /// else the platform configuration directory.
    pub fn settings_file_path(&self) -> PathBuf {
        match &self.settings_file {
            Some(path) => PathBuf::from(path),
            None => default_settings_file_path(),
        }
    }
}

/// Errors raised while reading or writing the settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Connection settings for the archive and its image server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Archive root, used for metadata, search and download URLs
    pub base_url: String,

    /// Image API server root, without the version segment
    pub image_server_url: String,

    /// Request timeout in seconds
    pub timeout: f64,

    pub verify_ssl: bool,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            base_url: "https://archive.org".to_string(),
            image_server_url: "https://iiif.archive.org/image/iiif".to_string(),
            timeout: 30.0,
            verify_ssl: true,
        }
    }
}

/// How produced documents name themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSettings {
    /// Base of document ids, normalised to `https://.../iiif/`
    pub domain: String,

    /// Base of canvas ids
    pub uri_prefix: String,

    /// Language key for labels that carry no language of their own
    pub label_language: String,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            domain: "https://iiif.archive.org/iiif/".to_string(),
            uri_prefix: "https://iiif.archive.org/iiif".to_string(),
            label_language: "none".to_string(),
        }
    }
}

/// Application settings persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub archive: ArchiveSettings,

    #[serde(default)]
    pub presentation: PresentationSettings,
}

impl AppSettings {
    /// Load settings from `path`, writing the defaults there first if the file does not exist.
    ///
    /// # Arguments
    /// * `path` - Location of the settings file
    ///
    /// # Returns
    /// * `Result<Self, SettingsError>` - The settings or error
    pub fn load_or_create_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();

        if !path.exists() {
            let settings = Self::default();
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&settings)?)?;
            info!("Created default settings file at {}", path.display());
            return Ok(settings);
        }

        debug!("Reading settings from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Default location of the settings file in the platform configuration directory.
pub fn default_settings_file_path() -> PathBuf {
    ProjectDirs::from("org", "archive", "iiify")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME))
}
