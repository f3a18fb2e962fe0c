//! Configuration for gentoo-update
//!
//! [`AppConfig`] is built once at startup and handed to every component by
//! reference.

mod hierarchical_loader;
mod types;

pub use hierarchical_loader::{HierarchicalConfigLoader, CONFIG_FILE, SYSTEM_CONFIG_DIR};
pub use types::{
    CommandSettings, ExternalCommand, KernelSettings, PortageSettings, SelfUpdateSettings,
    Settings,
};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::identity::ProgramIdentity;

/// Immutable configuration of one program run
#[derive(Debug, Clone)]
pub struct AppConfig {
    identity: ProgramIdentity,
    self_path: PathBuf,
    settings: Settings,
}

impl AppConfig {
    /// Assemble a configuration from its parts
    pub fn new(identity: ProgramIdentity, self_path: PathBuf, settings: Settings) -> Self {
        Self {
            identity,
            self_path,
            settings,
        }
    }

    /// Configuration of the running executable, settings from `loader`
    pub fn load(loader: &HierarchicalConfigLoader) -> Result<Self> {
        let self_path = std::env::current_exe()?.canonicalize()?;
        let name = self_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gentoo-update".to_string());

        Ok(Self::new(
            ProgramIdentity::current(name)?,
            self_path,
            loader.load_settings()?,
        ))
    }

    /// Program name and revision
    pub fn identity(&self) -> &ProgramIdentity {
        &self.identity
    }

    /// Resolved path of the running executable
    pub fn self_path(&self) -> &Path {
        &self.self_path
    }

    /// Loaded settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
