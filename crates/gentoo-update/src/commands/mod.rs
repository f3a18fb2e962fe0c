//! Command implementations

pub mod self_update;
pub mod upgrade;
pub mod version;

use anyhow::{Context, Result};
use gentoo_update_core::preflight::{ensure_portage_host, ensure_root};
use gentoo_update_core::{AppConfig, HierarchicalConfigLoader};

/// Check privileges, load configuration and check for a Portage tree
pub fn prepare() -> Result<AppConfig> {
    ensure_root()?;
    let config = AppConfig::load(&HierarchicalConfigLoader::new())
        .context("Failed to load configuration")?;
    ensure_portage_host(&config.settings().portage.marker_dirs)?;
    Ok(config)
}
