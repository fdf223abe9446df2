//! Configuration file parser for ~/.config/sarvail/config.toml.
//!
//! The file is optional; a missing or empty file yields `Config::default()`.
//! Unknown keys are accepted but logged so typos are visible in the log.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Application configuration. Any subset of keys may be given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the custom REST routes.
    pub base_url: String,

    /// `per_page` sent with every feed request.
    pub per_page: u32,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Scroll movements smaller than this (in virtual pixels) keep the
    /// search bar as it is. 0 reacts to every movement.
    pub scroll_jitter_threshold: u32,

    /// Carousel autoplay interval.
    pub carousel_interval_ms: u64,

    /// "dark" or "light".
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: Self::DEFAULT_PER_PAGE,
            request_timeout_secs: 30,
            scroll_jitter_threshold: 0,
            carousel_interval_ms: 2000,
            theme: "dark".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    pub const DEFAULT_PER_PAGE: u32 = 10;
    /// WordPress caps `per_page` at 100.
    const MAX_PER_PAGE: u32 = 100;
    /// Autoplay faster than this would redraw on every tick.
    const MIN_CAROUSEL_INTERVAL_MS: u64 = 500;

    const KNOWN_KEYS: [&'static str; 6] = [
        "base_url",
        "per_page",
        "request_timeout_secs",
        "scroll_jitter_threshold",
        "carousel_interval_ms",
        "theme",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Out-of-range numbers are clamped with a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(path = %path.display(), base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }

    /// Parse TOML text; blank input gives the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.per_page == 0 || self.per_page > Self::MAX_PER_PAGE {
            let clamped = self.per_page.clamp(1, Self::MAX_PER_PAGE);
            tracing::warn!(per_page = self.per_page, clamped, "per_page out of range");
            self.per_page = clamped;
        }
        if self.request_timeout_secs == 0 {
            tracing::warn!("request_timeout_secs = 0 is not allowed, using 1");
            self.request_timeout_secs = 1;
        }
        if self.carousel_interval_ms < Self::MIN_CAROUSEL_INTERVAL_MS {
            tracing::warn!(
                carousel_interval_ms = self.carousel_interval_ms,
                "Carousel interval too short, using {}ms",
                Self::MIN_CAROUSEL_INTERVAL_MS
            );
            self.carousel_interval_ms = Self::MIN_CAROUSEL_INTERVAL_MS;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn carousel_interval(&self) -> Duration {
        Duration::from_millis(self.carousel_interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
