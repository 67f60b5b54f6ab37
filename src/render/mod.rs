// src/render/mod.rs

//! Configuration fragments for the downstream services
//!
//! Each site yields one v3 onion service in Tor, mapping virtual port 80 to
//! the site's Unix socket, and one nginx virtual host listening on that same
//! socket. The fragments render to the services' native formats so they can
//! be dropped into `torrc` and an nginx `http {}` include.

mod nginx;
mod tor;

pub use nginx::{Listen, NginxVHostConfig, VirtualHost, DEFAULT_INDEX, HARDENING_HEADERS};
pub use tor::{
    OnionService, OnionServiceConfig, PortMapping, PortTarget, ONION_SERVICE_VERSION,
    VIRTUAL_PORT,
};

use crate::error::Result;
use crate::model::SiteSet;
use crate::reconcile::derive_sites;

/// Build the Tor and nginx fragments for every site in the set
pub fn render_downstream_config(set: &SiteSet) -> Result<(OnionServiceConfig, NginxVHostConfig)> {
    let sites = derive_sites(set)?;

    let services = sites
        .iter()
        .map(|site| OnionService {
            name: site.name.clone(),
            data_dir: site.hidden_service_dir.clone(),
            version: ONION_SERVICE_VERSION,
            ports: vec![PortMapping {
                virtual_port: VIRTUAL_PORT,
                target: PortTarget::Unix(site.socket_path.clone()),
            }],
        })
        .collect();

    let hosts = sites
        .iter()
        .map(|site| VirtualHost {
            name: site.name.clone(),
            listen: Listen::Unix(site.socket_path.clone()),
            root: site.web_root.clone(),
            index: DEFAULT_INDEX.iter().map(|s| s.to_string()).collect(),
            headers: HARDENING_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            deny_dotfiles: true,
        })
        .collect();

    Ok((
        OnionServiceConfig {
            socks_port: set.tor().socks_port.clone(),
            services,
        },
        NginxVHostConfig { hosts },
    ))
}
