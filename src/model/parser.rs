// src/model/parser.rs

//! Parser for site configuration TOML files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::SiteSet;

/// Root of the per-site onion data directories
pub const DEFAULT_TOR_DATA_ROOT: &str = "/var/lib/tor/onion";

/// Directory name under /run holding the shared socket directory
pub const DEFAULT_SOCKET_PREFIX: &str = "onion-sites";

/// Parent of the default web roots
pub const DEFAULT_WWW_ROOT: &str = "/var/www";

/// Client listener Tor is configured with
pub const DEFAULT_SOCKS_PORT: &str = "127.0.0.1:9050";

/// The full site configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitesConfig {
    /// Master switch; a disabled configuration declares no sites
    #[serde(default)]
    pub enable: bool,

    /// Fixed roots that default paths derive from
    #[serde(default)]
    pub layout: Layout,

    /// Service identities owning the provisioned paths
    #[serde(default)]
    pub identities: Identities,

    /// Daemon-level Tor settings
    #[serde(default)]
    pub tor: TorSettings,

    /// Declared sites (site name -> declaration)
    #[serde(default)]
    pub sites: BTreeMap<String, SiteDecl>,
}

/// A single `[sites.<name>]` table as written by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDecl {
    /// Document root; defaults to `<www_root>/<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_root: Option<PathBuf>,

    /// Socket shared by Tor and nginx; defaults to `/run/<prefix>/sockets/<name>.sock`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Generate placeholder index.html and styles.css when missing
    #[serde(default)]
    pub create_default_site: bool,
}

/// Filesystem roots used to derive per-site paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default = "default_tor_data_root")]
    pub tor_data_root: PathBuf,

    #[serde(default = "default_socket_prefix")]
    pub socket_prefix: String,

    #[serde(default = "default_www_root")]
    pub www_root: PathBuf,
}

fn default_tor_data_root() -> PathBuf {
    PathBuf::from(DEFAULT_TOR_DATA_ROOT)
}

fn default_socket_prefix() -> String {
    DEFAULT_SOCKET_PREFIX.to_string()
}

fn default_www_root() -> PathBuf {
    PathBuf::from(DEFAULT_WWW_ROOT)
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            tor_data_root: default_tor_data_root(),
            socket_prefix: default_socket_prefix(),
            www_root: default_www_root(),
        }
    }
}

impl Layout {
    /// Shared directory holding every default site socket
    pub fn socket_dir(&self) -> PathBuf {
        Path::new("/run").join(&self.socket_prefix).join("sockets")
    }

    /// Hidden service data directory for a site
    pub fn hidden_service_dir(&self, name: &str) -> PathBuf {
        self.tor_data_root.join(name)
    }

    pub fn default_web_root(&self, name: &str) -> PathBuf {
        self.www_root.join(name)
    }

    pub fn default_socket_path(&self, name: &str) -> PathBuf {
        self.socket_dir().join(format!("{}.sock", name))
    }
}

/// A user and group pair, by name or numeric id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    pub user: String,
    pub group: String,
}

impl Ownership {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}

/// Identities of the two downstream services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identities {
    /// Owner of the hidden service data directories
    #[serde(default = "default_tor_identity")]
    pub tor: Ownership,

    /// Owner of the socket directory and web roots
    #[serde(default = "default_web_identity")]
    pub web: Ownership,
}

fn default_tor_identity() -> Ownership {
    Ownership::new("tor", "tor")
}

fn default_web_identity() -> Ownership {
    Ownership::new("nginx", "nginx")
}

impl Default for Identities {
    fn default() -> Self {
        Self {
            tor: default_tor_identity(),
            web: default_web_identity(),
        }
    }
}

/// Tor daemon settings rendered alongside the onion services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorSettings {
    /// `SocksPort` value; keeps the daemon client-capable
    #[serde(default = "default_socks_port")]
    pub socks_port: String,
}

fn default_socks_port() -> String {
    DEFAULT_SOCKS_PORT.to_string()
}

impl Default for TorSettings {
    fn default() -> Self {
        Self {
            socks_port: default_socks_port(),
        }
    }
}

impl SitesConfig {
    /// Create an enabled configuration with no sites
    pub fn new() -> Self {
        Self {
            enable: true,
            ..Self::default()
        }
    }

    /// Declare a site, replacing any previous declaration with the same name
    pub fn add_site(&mut self, name: impl Into<String>, decl: SiteDecl) -> &mut Self {
        self.sites.insert(name.into(), decl);
        self
    }

    /// Validate the configuration and produce the immutable site set
    pub fn resolve(&self) -> Result<SiteSet> {
        SiteSet::from_config(self)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parse a site configuration from a TOML file
pub fn parse_config_file(path: &Path) -> Result<SitesConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_string(&content)
}

/// Parse a site configuration from a TOML string
///
/// Only the syntax and schema are checked here; names, paths and
/// collisions are validated by [`SitesConfig::resolve`].
pub fn parse_config_string(content: &str) -> Result<SitesConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_disabled() {
        let config = parse_config_string("").unwrap();
        assert!(!config.enable);
        assert!(config.sites.is_empty());
        assert_eq!(config.layout, Layout::default());
        assert_eq!(config.identities.tor, Ownership::new("tor", "tor"));
        assert_eq!(config.identities.web, Ownership::new("nginx", "nginx"));
    }

    #[test]
    fn test_parse_sites() {
        let toml = r#"
enable = true

[sites.blog]
create_default_site = true

[sites.shop]
web_root = "/srv/shop"
socket_path = "/run/x/shop.sock"
"#;
        let config = parse_config_string(toml).unwrap();
        assert!(config.enable);
        assert_eq!(config.sites.len(), 2);
        assert!(config.sites["blog"].create_default_site);
        assert_eq!(config.sites["blog"].web_root, None);
        assert_eq!(
            config.sites["shop"].socket_path,
            Some(PathBuf::from("/run/x/shop.sock"))
        );
    }

    #[test]
    fn test_parse_layout_and_identities() {
        let toml = r#"
enable = true

[layout]
socket_prefix = "hs"

[identities.web]
user = "www-data"
group = "www-data"

[tor]
socks_port = "0"
"#;
        let config = parse_config_string(toml).unwrap();
        assert_eq!(config.layout.socket_dir(), PathBuf::from("/run/hs/sockets"));
        assert_eq!(config.layout.tor_data_root, PathBuf::from(DEFAULT_TOR_DATA_ROOT));
        assert_eq!(config.identities.web.to_string(), "www-data:www-data");
        assert_eq!(config.identities.tor, Ownership::new("tor", "tor"));
        assert_eq!(config.tor.socks_port, "0");
    }

    #[test]
    fn test_unknown_site_key_rejected() {
        let toml = r#"
enable = true

[sites.blog]
webroot = "/srv/blog"
"#;
        let result = parse_config_string(toml);
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_unsafe_name_rejected_at_resolve() {
        let toml = r#"
enable = true

[sites."../etc"]
"#;
        let config = parse_config_string(toml).unwrap();
        let result = config.resolve();
        assert!(matches!(result, Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut config = SitesConfig::new();
        config.add_site(
            "blog",
            SiteDecl {
                create_default_site: true,
                ..SiteDecl::default()
            },
        );

        let toml = config.to_toml().unwrap();
        let parsed = parse_config_string(&toml).unwrap();

        assert!(parsed.enable);
        assert_eq!(parsed.sites, config.sites);
    }
}
