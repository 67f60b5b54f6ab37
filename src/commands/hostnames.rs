// src/commands/hostnames.rs

//! Onion address listing

use anyhow::Result;
use onionsite::{derive_state, read_hostname, HostFilesystem};
use std::path::Path;

use super::load_site_set;

/// Print the onion address Tor generated for each site
pub fn cmd_hostnames(config_path: &str, root: &str) -> Result<()> {
    let set = load_site_set(config_path)?;
    let state = derive_state(&set)?;

    if state.sites.is_empty() {
        println!("No sites declared");
        return Ok(());
    }

    let fs = HostFilesystem::new(Path::new(root));
    let width = state.sites.iter().map(|s| s.name.len()).max().unwrap_or(0);

    let mut pending = 0;
    for site in &state.sites {
        match read_hostname(&fs, site)? {
            Some(address) => println!("{:width$}  {}", site.name, address, width = width),
            None => {
                pending += 1;
                println!("{:width$}  (not generated yet)", site.name, width = width);
            }
        }
    }

    if pending > 0 {
        println!();
        println!("Tor writes each address on its first start with the service configured");
    }

    Ok(())
}
