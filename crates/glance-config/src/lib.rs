use serde::{Deserialize, Serialize};
use shared::Size;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_VERSION: u64 = 1;
const APP_ID: &str = "glance";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
}

/// Library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlanceConfig {
    pub version: u64,
    /// Number of built model loaders the registry keeps around
    pub loader_cache_capacity: usize,
    /// Decode worker threads, 0 uses the global rayon pool
    pub decode_threads: usize,
    /// Size requested from loaders while a target has not been laid out
    pub fallback_size: Size,
    /// Base directory for relative file models
    pub root_dir: Option<PathBuf>,
    /// Default tracing filter
    pub log_level: String,
}

impl Default for GlanceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            loader_cache_capacity: 16,
            decode_threads: 0,
            fallback_size: Size::new(1024, 1024),
            root_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl GlanceConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: GlanceConfig = serde_json::from_str(&content)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resolve a relative model path against `root_dir`.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        resolve_against(self.root_dir.as_deref(), path)
    }
}

pub fn resolve_against(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// `~/.config/glance/config.json` (XDG config dir on Linux).
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_ID).join(CONFIG_FILE))
}

/// Load the user config, falling back to defaults when it is missing or broken.
pub fn load() -> GlanceConfig {
    let Some(path) = config_path() else {
        debug!("No config directory, using defaults");
        return GlanceConfig::default();
    };

    if !path.exists() {
        return GlanceConfig::default();
    }

    match GlanceConfig::from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            warn!("Ignoring config at {}: {}", path.display(), err);
            GlanceConfig::default()
        }
    }
}
