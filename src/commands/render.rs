// src/commands/render.rs

//! Downstream configuration rendering

use anyhow::{Context, Result};
use onionsite::derive_state;
use std::fs;
use std::path::Path;
use tracing::info;

use super::load_site_set;

/// File name of the rendered Tor fragment
const TORRC_FILE: &str = "torrc";

/// File name of the rendered nginx fragment
const NGINX_FILE: &str = "nginx.conf";

/// Render the Tor and nginx fragments for a site configuration
pub fn cmd_render(config_path: &str, output_dir: Option<&str>, json: bool) -> Result<()> {
    let set = load_site_set(config_path)?;
    let state = derive_state(&set)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let torrc = state.onion.to_torrc();
    let nginx = state.vhosts.to_nginx_conf();

    let Some(dir) = output_dir else {
        println!("# --- {} ---", TORRC_FILE);
        print!("{}", torrc);
        println!();
        println!("# --- {} ---", NGINX_FILE);
        print!("{}", nginx);
        return Ok(());
    };

    let dir = Path::new(dir);
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    for (name, content) in [(TORRC_FILE, &torrc), (NGINX_FILE, &nginx)] {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        println!("Wrote {}", path.display());
    }

    Ok(())
}
