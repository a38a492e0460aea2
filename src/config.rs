//! Configuration management for feedback-form
//!
//! Config file location:
//! - Linux: ~/.config/feedback-form/config.toml
//! - macOS: ~/Library/Application Support/feedback-form/config.toml
//! - Windows: %APPDATA%/feedback-form/config.toml
//!
//! You can override the config location by setting `FEEDBACK_FORM_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Screenshot capture settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("FEEDBACK_FORM_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }
}

/// Log file used by the interactive screen (stderr belongs to the terminal there).
pub fn log_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("feedback-form.log"))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "feedback", "feedback-form")
        .context("Could not determine project directories")
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// API timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Whether to verify SSL certificates
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_seconds: default_timeout(),
            verify_ssl: default_true(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Screenshot capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Image format requested from the capture command
    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// Capture quality between 0.0 and 1.0
    #[serde(default = "default_quality")]
    pub quality: f32,

    /// Shell command that writes a screenshot to `{path}`, used instead of the built-in
    /// screen grab. `{path}` is substituted already quoted. Also understands `{format}`,
    /// `{quality}` (0.0-1.0) and `{quality_pct}` (0-100).
    #[serde(default)]
    pub command: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            image_format: default_image_format(),
            quality: default_quality(),
            command: None,
        }
    }
}

fn default_image_format() -> String {
    "jpg".to_string()
}

fn default_quality() -> f32 {
    0.8
}

/// Get configuration file path for display purposes
pub fn get_config_path() -> Result<String> {
    let path = Config::config_path()?;
    Ok(path.display().to_string())
}
