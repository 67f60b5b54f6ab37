// src/render/tor.rs

//! Onion service definitions for the Tor daemon.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Hidden service descriptor version emitted for every site
pub const ONION_SERVICE_VERSION: u8 = 3;

/// Port visitors reach the site on
pub const VIRTUAL_PORT: u16 = 80;

/// Where Tor forwards a virtual port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "lowercase")]
pub enum PortTarget {
    Unix(PathBuf),
}

impl PortTarget {
    fn to_torrc(&self) -> String {
        match self {
            PortTarget::Unix(path) => format!("unix:{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub virtual_port: u16,
    pub target: PortTarget,
}

/// One onion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnionService {
    /// Site the service belongs to
    pub name: String,
    pub data_dir: PathBuf,
    pub version: u8,
    pub ports: Vec<PortMapping>,
}

/// The Tor fragment: daemon client settings plus every onion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnionServiceConfig {
    pub socks_port: String,
    pub services: Vec<OnionService>,
}

impl OnionServiceConfig {
    /// Render as torrc lines
    pub fn to_torrc(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Generated by onionsite. Do not edit.");
        let _ = writeln!(out, "SocksPort {}", self.socks_port);

        for service in &self.services {
            let _ = writeln!(out);
            let _ = writeln!(out, "# {}", service.name);
            let _ = writeln!(out, "HiddenServiceDir {}", service.data_dir.display());
            let _ = writeln!(out, "HiddenServiceVersion {}", service.version);
            for port in &service.ports {
                let _ = writeln!(
                    out,
                    "HiddenServicePort {} {}",
                    port.virtual_port,
                    port.target.to_torrc()
                );
            }
        }

        out
    }
}
