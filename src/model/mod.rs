// src/model/mod.rs

//! Site Model - Declarative onion site definitions
//!
//! Operators describe the sites they want in a single TOML file. Each site
//! becomes a v3 onion service whose traffic Tor hands to nginx over a Unix
//! domain socket. The file is parsed into [`SitesConfig`], then resolved
//! into an immutable [`SiteSet`] that the reconciler consumes.
//!
//! # Example sites.toml
//!
//! ```toml
//! enable = true
//!
//! # Served from /var/www/blog, socket /run/onion-sites/sockets/blog.sock
//! [sites.blog]
//! create_default_site = true
//!
//! # Explicit paths
//! [sites.shop]
//! web_root = "/srv/shop"
//! socket_path = "/run/x/shop.sock"
//! ```

pub mod parser;
mod site;

pub use parser::{
    parse_config_file, parse_config_string, Identities, Layout, Ownership, SiteDecl,
    SitesConfig, TorSettings, DEFAULT_SOCKET_PREFIX, DEFAULT_SOCKS_PORT, DEFAULT_TOR_DATA_ROOT,
    DEFAULT_WWW_ROOT,
};
pub use site::{validate_site_name, SiteSpec, MAX_SITE_NAME_LEN};

use site::validate_config_path;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Default path for the site configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/onionsite/sites.toml";

/// Load a site configuration from the default or specified path
pub fn load_config(path: Option<&Path>) -> Result<SitesConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    parse_config_file(path)
}

/// Check if a site configuration file exists
pub fn config_exists(path: Option<&Path>) -> bool {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    path.exists()
}

/// The validated, immutable input to the reconciler
///
/// Sites are keyed and iterated by name, so everything derived from a
/// `SiteSet` comes out in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSet {
    layout: Layout,
    identities: Identities,
    tor: TorSettings,
    sites: BTreeMap<String, SiteSpec>,
}

impl SiteSet {
    /// Build a site set from already resolved specs
    pub fn new(
        layout: Layout,
        identities: Identities,
        tor: TorSettings,
        specs: impl IntoIterator<Item = SiteSpec>,
    ) -> Result<Self> {
        validate_layout(&layout)?;
        validate_identities(&identities)?;
        validate_tor(&tor)?;

        let mut sites = BTreeMap::new();
        for spec in specs {
            let name = spec.name().to_string();
            if sites.insert(name.clone(), spec).is_some() {
                return Err(Error::InvalidSpec(format!(
                    "site '{}' is declared more than once",
                    name
                )));
            }
        }

        let set = Self {
            layout,
            identities,
            tor,
            sites,
        };

        // Path collisions are reported at construction
        crate::reconcile::derive_sites(&set)?;

        Ok(set)
    }

    /// Resolve a parsed configuration; a disabled configuration yields no sites
    pub fn from_config(config: &SitesConfig) -> Result<Self> {
        let specs = if config.enable {
            config
                .sites
                .iter()
                .map(|(name, decl)| SiteSpec::resolve(name, decl, &config.layout))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Self::new(
            config.layout.clone(),
            config.identities.clone(),
            config.tor.clone(),
            specs,
        )
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn identities(&self) -> &Identities {
        &self.identities
    }

    pub fn tor(&self) -> &TorSettings {
        &self.tor
    }

    /// Look up a site by name
    pub fn get(&self, name: &str) -> Option<&SiteSpec> {
        self.sites.get(name)
    }

    /// All sites in name order
    pub fn sites(&self) -> impl Iterator<Item = &SiteSpec> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Sites whose socket lives outside the shared socket directory
    ///
    /// The parent directory of such a socket is not provisioned.
    pub fn external_sockets(&self) -> impl Iterator<Item = &SiteSpec> {
        let socket_dir = self.layout.socket_dir();
        self.sites
            .values()
            .filter(move |spec| spec.socket_path().parent() != Some(socket_dir.as_path()))
    }
}

fn validate_layout(layout: &Layout) -> Result<()> {
    validate_site_name(&layout.socket_prefix).map_err(|_| {
        Error::InvalidSpec(format!(
            "layout.socket_prefix '{}' must be a single safe path component",
            layout.socket_prefix
        ))
    })?;

    // Every default data directory and web root is built from these
    validate_config_path("layout.tor_data_root", &layout.tor_data_root)?;
    validate_config_path("layout.www_root", &layout.www_root)?;

    Ok(())
}

fn validate_identities(identities: &Identities) -> Result<()> {
    for (field, owner) in [("tor", &identities.tor), ("web", &identities.web)] {
        for value in [&owner.user, &owner.group] {
            if value.is_empty()
                || value.contains(':')
                || value.chars().any(|c| c.is_whitespace() || c.is_control())
            {
                return Err(Error::InvalidSpec(format!(
                    "identities.{} has invalid user or group '{}'",
                    field, value
                )));
            }
        }
    }
    Ok(())
}

fn validate_tor(tor: &TorSettings) -> Result<()> {
    // Rendered verbatim into torrc, one directive per line
    if tor.socks_port.trim().is_empty() || tor.socks_port.chars().any(char::is_control) {
        return Err(Error::InvalidSpec(format!(
            "tor.socks_port '{}' is not a valid listener",
            tor.socks_port.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rejects_bad_socks_port() {
        let mut config = SitesConfig::new();
        config.tor.socks_port = "9050\nControlPort 9051".to_string();
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));

        config.tor.socks_port = String::new();
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_rejects_empty_identity() {
        let mut config = SitesConfig::new();
        config.identities.web.user = String::new();
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_disabled_config_has_no_sites() {
        let mut config = SitesConfig::default();
        config.add_site("blog", SiteDecl::default());
        assert!(!config.enable);

        let set = SiteSet::from_config(&config).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_sites_in_name_order() {
        let mut config = SitesConfig::new();
        config.add_site("zeta", SiteDecl::default());
        config.add_site("alpha", SiteDecl::default());

        let set = config.resolve().unwrap();
        let names: Vec<_> = set.sites().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(set.get("alpha").is_some());
        assert!(set.get("beta").is_none());
    }

    #[test]
    fn test_duplicate_spec_rejected() {
        let layout = Layout::default();
        let a = SiteSpec::with_defaults("a", &layout).unwrap();
        let result = SiteSet::new(
            layout,
            Identities::default(),
            TorSettings::default(),
            vec![a.clone(), a],
        );
        assert!(matches!(result, Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_bad_layout_rejected() {
        let mut config = SitesConfig::new();
        config.layout.socket_prefix = "../tmp".to_string();
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));

        let mut config = SitesConfig::new();
        config.layout.www_root = PathBuf::from("www");
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_layout_roots_checked_like_site_paths() {
        let mut config = SitesConfig::new();
        config.add_site("blog", SiteDecl::default());
        config.layout.tor_data_root =
            PathBuf::from("/var/lib/tor\nControlPort 0.0.0.0:9051\nHiddenServiceDir /x");
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));

        for bad in ["/var/www/../../etc", "/var/www site", "/var/{www}", "/srv;"] {
            let mut config = SitesConfig::new();
            config.layout.www_root = PathBuf::from(bad);
            assert!(
                matches!(config.resolve(), Err(Error::InvalidSpec(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_external_sockets() {
        let mut config = SitesConfig::new();
        config.add_site("blog", SiteDecl::default());
        config.add_site(
            "shop",
            SiteDecl {
                socket_path: Some(PathBuf::from("/run/x/shop.sock")),
                ..SiteDecl::default()
            },
        );
        let set = config.resolve().unwrap();

        let names: Vec<_> = set.external_sockets().map(|s| s.name()).collect();
        assert_eq!(names, vec!["shop"]);
    }

    #[test]
    fn test_load_missing_config() {
        let path = Path::new("/nonexistent/onionsite/sites.toml");
        assert!(!config_exists(Some(path)));
        assert!(matches!(
            load_config(Some(path)),
            Err(Error::ConfigRead { .. })
        ));
    }
}
