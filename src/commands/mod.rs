// src/commands/mod.rs
//! Command handlers for the onionsite CLI

mod apply;
mod hostnames;
mod plan;
mod render;
mod validate;

pub use apply::cmd_apply;
pub use hostnames::cmd_hostnames;
pub use plan::cmd_plan;
pub use render::cmd_render;
pub use validate::cmd_validate;

use anyhow::{anyhow, Context, Result};
use onionsite::{load_config, SiteSet};
use std::path::Path;
use tracing::{debug, warn};

/// Load and resolve the site configuration at `config_path`
pub(crate) fn load_site_set(config_path: &str) -> Result<SiteSet> {
    let path = Path::new(config_path);
    if !path.exists() {
        eprintln!("Error: Site configuration not found: {}", path.display());
        return Err(anyhow!("Site configuration not found"));
    }

    let config = load_config(Some(path))
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if !config.enable {
        warn!("{} has enable = false; no sites will be managed", path.display());
    }

    let set = config
        .resolve()
        .with_context(|| format!("Invalid site configuration in {}", path.display()))?;
    for spec in set.external_sockets() {
        warn!(
            "Site '{}' uses socket {} outside {}; its parent directory is not provisioned",
            spec.name(),
            spec.socket_path().display(),
            set.layout().socket_dir().display()
        );
    }
    debug!("Loaded {} site(s) from {}", set.len(), path.display());
    Ok(set)
}
