// ⚙️ Configuration - plant-linker.toml plus PLANT_LINKER_* overrides
//
// Every section is optional. A missing file means defaults; a file that
// exists but does not parse is an error.

use crate::insights::DEFAULT_TOP_MATERIALS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "plant-linker.toml";
pub const CONFIG_PATH_ENV: &str = "PLANT_LINKER_CONFIG";

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub pnid_path: Option<PathBuf>,
    pub iso_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub top_materials: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        InsightsConfig {
            top_materials: DEFAULT_TOP_MATERIALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directive applied to this crate ("info", "debug", ...)
    pub level: String,
    /// Emit JSON lines instead of the human format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub insights: InsightsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ============================================================================
// LOADING
// ============================================================================

impl Config {
    /// Parse TOML text (no env overrides)
    pub fn parse_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML config")
    }

    /// Load `path` if it exists, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse_toml(&text)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Explicit path, else $PLANT_LINKER_CONFIG, else ./plant-linker.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Apply `PLANT_LINKER_*` variables from the process environment
    ///
    /// - `PLANT_LINKER_PNID_PATH` → `input.pnid_path`
    /// - `PLANT_LINKER_ISO_PATH` → `input.iso_path`
    /// - `PLANT_LINKER_TOP_MATERIALS` → `insights.top_materials`
    /// - `PLANT_LINKER_BIND` → `server.bind`
    /// - `PLANT_LINKER_LOG_LEVEL` → `logging.level`
    /// - `PLANT_LINKER_LOG_JSON` → `logging.json`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PLANT_LINKER_PNID_PATH") {
            self.input.pnid_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PLANT_LINKER_ISO_PATH") {
            self.input.iso_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PLANT_LINKER_TOP_MATERIALS") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.insights.top_materials = n,
                Err(_) => tracing::warn!(value = %v, "ignoring PLANT_LINKER_TOP_MATERIALS"),
            }
        }
        if let Some(v) = lookup("PLANT_LINKER_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = lookup("PLANT_LINKER_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("PLANT_LINKER_LOG_JSON") {
            match v.trim().to_lowercase().parse::<bool>() {
                Ok(b) => self.logging.json = b,
                Err(_) => tracing::warn!(value = %v, "ignoring PLANT_LINKER_LOG_JSON"),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
