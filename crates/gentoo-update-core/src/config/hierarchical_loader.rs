//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. System config (/etc/gentoo-update/config.yaml)
//! 3. Environment variables (GENTOO_UPDATE_* prefix)

use crate::config::types::Settings;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::{Mapping, Value};
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Default system configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/gentoo-update";

/// Configuration file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl Default for HierarchicalConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalConfigLoader {
    /// Create a loader reading the system config directory
    pub fn new() -> Self {
        Self::with_dir(Utf8PathBuf::from(SYSTEM_CONFIG_DIR))
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Load settings with hierarchical precedence
    pub fn load_settings(&self) -> Result<Settings> {
        let mut document = Self::load_embedded_document("defaults.yaml")?;

        let config_path = self.config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            debug!("Merging configuration from {}", config_path);
            let overlay = self.load_yaml_file(&config_path)?;
            merge_values(&mut document, overlay);
        }

        let settings: Settings = serde_yaml_ng::from_value(document)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))?;

        self.apply_env_overrides(settings)
    }

    /// Load an embedded configuration file as an untyped document
    fn load_embedded_document(filename: &str) -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(filename)
            .ok_or_else(|| Error::config(format!("Embedded config not found: {}", filename)))?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file as an untyped document
    fn load_yaml_file(&self, path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(&self, mut settings: Settings) -> Result<Settings> {
        if let Ok(val) = env::var("GENTOO_UPDATE_URL") {
            settings.self_update.url = val;
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_TIMEOUT_SECS") {
            settings.self_update.timeout_secs = val.parse().map_err(|_| {
                Error::config("GENTOO_UPDATE_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_USER_AGENT") {
            settings.self_update.user_agent = val;
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_TEMP_DIR") {
            settings.self_update.temp_dir = Some(Utf8PathBuf::from(val));
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_DISTFILES_DIR") {
            settings.portage.distfiles_dir = Utf8PathBuf::from(val);
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_HEADER_LINES") {
            settings.portage.header_lines = val.parse().map_err(|_| {
                Error::config("GENTOO_UPDATE_HEADER_LINES must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("GENTOO_UPDATE_SCAN_MISSED") {
            settings.portage.scan_missed_updates = val.parse().map_err(|_| {
                Error::config("GENTOO_UPDATE_SCAN_MISSED must be true or false")
            })?;
        }

        Ok(settings)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

/// Merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_mappings(base_map, overlay_map);
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

fn merge_mappings(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) if existing.is_mapping() && value.is_mapping() => {
                merge_values(existing, value);
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}
