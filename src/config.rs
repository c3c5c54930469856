use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cli::ScanPreset;
use crate::error::{Result, ScanError};

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Settings read from `<config dir>/nmapscope/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub nmap_path: Option<PathBuf>,
    pub extra_search_paths: Vec<PathBuf>,
    pub probe_timeout_secs: u64,
    pub default_scan_type: String,
    pub scan_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nmap_path: None,
            extra_search_paths: Vec::new(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            default_scan_type: ScanPreset::Quick.name().to_string(),
            scan_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads the user config, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from_file(&path) {
                Ok(config) => {
                    debug!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("nmapscope");
        path.push("config.json");
        Some(path)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScanError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ScanError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn default_preset(&self) -> ScanPreset {
        ScanPreset::from_name(&self.default_scan_type)
    }
}
