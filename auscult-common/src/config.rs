//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments or their `AUSCULT_*` environment variables
//!    (highest priority, both parsed by the binary's clap `Args`)
//! 2. TOML config file
//! 3. Compiled defaults (fallback)
//!
//! A missing TOML file SHALL NOT terminate startup: the service logs a warning
//! and continues on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything left out falls through to
/// [`CompiledDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server to
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Directory holding the four model artifacts
    #[serde(default)]
    pub models_dir: Option<PathBuf>,

    /// Directory for transient uploaded audio
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,

    /// Maximum accepted request body size in bytes
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the config file if it exists
    ///
    /// Returns `Ok(None)` when the file is absent so callers can fall back to
    /// defaults; parse failures are still reported.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

/// Built-in defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            models_dir: PathBuf::from("models"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 25 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

/// Values supplied on the command line or through the environment
///
/// `None` means "not given at this tier".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub models_dir: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML and compiled defaults (in that priority order)
    pub fn resolve(overrides: ConfigOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            host: overrides
                .host
                .or_else(|| toml.host.clone())
                .unwrap_or(defaults.host),
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            models_dir: overrides
                .models_dir
                .or_else(|| toml.models_dir.clone())
                .unwrap_or(defaults.models_dir),
            upload_dir: overrides
                .upload_dir
                .or_else(|| toml.upload_dir.clone())
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(toml.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            log_level: overrides
                .log_level
                .or_else(|| toml.logging.level.clone())
                .unwrap_or(defaults.log_level),
        }
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the TOML config file
///
/// Explicit path (`--config` or `AUSCULT_CONFIG`) wins; otherwise
/// `<config dir>/auscult/auscult.toml`.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    dirs::config_dir().map(|d| d.join("auscult").join("auscult.toml"))
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        debug!("Created directory {}", path.display());
    } else if !path.is_dir() {
        return Err(Error::Config(format!(
            "{} exists but is not a directory",
            path.display()
        )));
    }
    Ok(())
}
