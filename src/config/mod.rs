mod render;

pub use render::RenderConfig;

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{AxviewError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page opened when no URL is given
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Render loop configuration
    #[serde(default)]
    pub render: RenderConfig,
}

fn default_start_url() -> String {
    "https://www.google.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser executable path (overrides auto-discovery)
    pub executable: Option<String>,

    /// Remote debugging port for the launched browser
    #[serde(default = "default_cdp_port")]
    pub cdp_port: u16,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User data directory for the launched browser
    pub user_data_dir: Option<String>,

    /// Extra browser arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_cdp_port() -> u16 {
    9222
}

fn default_headless() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            cdp_port: default_cdp_port(),
            headless: default_headless(),
            user_data_dir: None,
            extra_args: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            browser: BrowserConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration using a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Merge config file if exists
            .merge(Toml::file(path))
            // Merge environment variables (AXVIEW_RENDER__POLL_INTERVAL_MS, ...)
            .merge(Env::prefixed("AXVIEW_").split("__"))
            .extract()
            .map_err(|e| AxviewError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("axview")
            .join("config.toml")
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| AxviewError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read a single value by dotted key
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "start_url" => Some(self.start_url.clone()),
            "browser.executable" => self.browser.executable.clone(),
            "browser.cdp_port" => Some(self.browser.cdp_port.to_string()),
            "browser.headless" => Some(self.browser.headless.to_string()),
            "browser.user_data_dir" => self.browser.user_data_dir.clone(),
            "render.poll_interval_ms" => Some(self.render.poll_interval_ms.to_string()),
            "render.long_link_threshold" => Some(self.render.long_link_threshold.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "start_url" => self.start_url = value.to_string(),
            "browser.executable" => self.browser.executable = Some(value.to_string()),
            "browser.cdp_port" => self.browser.cdp_port = parse_value(key, value)?,
            "browser.headless" => self.browser.headless = parse_value(key, value)?,
            "browser.user_data_dir" => self.browser.user_data_dir = Some(value.to_string()),
            "render.poll_interval_ms" => self.render.poll_interval_ms = parse_value(key, value)?,
            "render.long_link_threshold" => {
                self.render.long_link_threshold = parse_value(key, value)?
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> AxviewError {
    AxviewError::ConfigError(format!("Unknown config key: {}", key))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| AxviewError::ConfigError(format!("Invalid value for {}: {}", key, value)))
}
