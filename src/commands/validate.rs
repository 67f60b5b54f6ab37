// src/commands/validate.rs

//! Configuration validation

use anyhow::Result;
use onionsite::derive_state;

use super::load_site_set;

/// Check a site configuration and summarize the sites it declares
pub fn cmd_validate(config_path: &str) -> Result<()> {
    let set = load_site_set(config_path)?;
    let state = derive_state(&set)?;

    if state.sites.is_empty() {
        println!("OK: no sites declared");
        return Ok(());
    }

    println!("OK: {} site(s)", state.sites.len());
    for site in &state.sites {
        println!("  {}", site.name);
        println!("    web root:  {}", site.web_root.display());
        println!("    socket:    {}", site.socket_path.display());
        println!("    data dir:  {}", site.hidden_service_dir.display());
        if site.create_default_site {
            println!("    placeholder content enabled");
        }
    }

    Ok(())
}
