//! Viewer configuration
//!
//! Read from a TOML file; every key is optional and command-line flags win
//! over file values.

use crate::cache::CACHE_TTL_HOURS;
use crate::coverage::DEFAULT_LOW_COVERAGE_THRESHOLD;
use crate::source::CLDR_BASE_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cldr-viewer";

/// A century; anything longer is a typo and would overflow the TTL duration
pub const MAX_TTL_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local cldr-json checkout (the directory holding cldr-dates-full etc.)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Fetch from the upstream repository instead of a local checkout
    #[serde(default)]
    pub remote: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where the record cache lives
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,

    /// Locale whose data defines what is expected
    #[serde(default = "default_reference_locale")]
    pub reference_locale: String,

    #[serde(default = "default_low_coverage_threshold")]
    pub low_coverage_threshold: f64,
}

fn default_base_url() -> String {
    CLDR_BASE_URL.to_string()
}
fn default_ttl_hours() -> i64 { CACHE_TTL_HOURS }
fn default_reference_locale() -> String { "en".to_string() }
fn default_low_coverage_threshold() -> f64 { DEFAULT_LOW_COVERAGE_THRESHOLD }

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            remote: false,
            base_url: default_base_url(),
            cache_dir: None,
            ttl_hours: default_ttl_hours(),
            reference_locale: default_reference_locale(),
            low_coverage_threshold: default_low_coverage_threshold(),
        }
    }
}

impl Config {
    /// `<config_dir>/cldr-viewer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    /// Load from `explicit` (must exist) or from the default location
    /// (defaults when absent)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ttl_hours <= 0 || self.ttl_hours > MAX_TTL_HOURS {
            anyhow::bail!(
                "ttl_hours must be within 1..={}, got {}",
                MAX_TTL_HOURS,
                self.ttl_hours
            );
        }
        if !(0.0..=100.0).contains(&self.low_coverage_threshold) {
            anyhow::bail!(
                "low_coverage_threshold must be within 0..=100, got {}",
                self.low_coverage_threshold
            );
        }
        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join(APP_NAME)
        })
    }

    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_dir().join("records.db")
    }

    pub fn ttl(&self) -> chrono::Duration {
        // Clamped; a hand-built Config skips validation
        chrono::Duration::hours(self.ttl_hours.clamp(1, MAX_TTL_HOURS))
    }
}
