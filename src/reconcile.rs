// src/reconcile.rs

//! Site reconciliation
//!
//! Maps a [`SiteSet`] to the state it implies: where each site's files,
//! socket and onion keys live, and what Tor and nginx must be told about
//! it. Everything here is pure computation; nothing touches the
//! filesystem. The provisioning side lives in [`crate::provision`].

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::SiteSet;
use crate::render::{render_downstream_config, NginxVHostConfig, OnionServiceConfig};

/// Paths derived for a single site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedSite {
    pub name: String,
    /// Tor-owned directory holding the service keys and `hostname`
    pub hidden_service_dir: PathBuf,
    pub socket_path: PathBuf,
    pub web_root: PathBuf,
    pub create_default_site: bool,
}

impl DerivedSite {
    /// File Tor writes the onion address to
    pub fn hostname_path(&self) -> PathBuf {
        self.hidden_service_dir.join("hostname")
    }
}

/// Everything the reconciler computes from a site set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedState {
    /// Shared parent of the default socket paths
    pub socket_dir: PathBuf,
    pub sites: Vec<DerivedSite>,
    pub onion: OnionServiceConfig,
    pub vhosts: NginxVHostConfig,
}

impl DerivedState {
    pub fn site(&self, name: &str) -> Option<&DerivedSite> {
        self.sites.iter().find(|s| s.name == name)
    }
}

/// Compute the full derived state for a site set
///
/// Deterministic: the same set always yields an identical state.
pub fn derive_state(set: &SiteSet) -> Result<DerivedState> {
    let sites = derive_sites(set)?;
    let (onion, vhosts) = render_downstream_config(set)?;

    Ok(DerivedState {
        socket_dir: set.layout().socket_dir(),
        sites,
        onion,
        vhosts,
    })
}

/// Compute per-site paths, rejecting any path claimed by two sites
///
/// Besides exact duplicates, web roots may not nest inside one another and
/// may not overlap the Tor data root: the web-root phase re-owns and
/// re-modes its whole tree.
pub fn derive_sites(set: &SiteSet) -> Result<Vec<DerivedSite>> {
    let layout = set.layout();

    let sites: Vec<DerivedSite> = set
        .sites()
        .map(|spec| DerivedSite {
            name: spec.name().to_string(),
            hidden_service_dir: layout.hidden_service_dir(spec.name()),
            socket_path: spec.socket_path().to_path_buf(),
            web_root: spec.web_root().to_path_buf(),
            create_default_site: spec.create_default_site(),
        })
        .collect();

    check_collisions(&sites)?;
    check_nesting(&sites, &layout.tor_data_root)?;

    Ok(sites)
}

fn check_collisions(sites: &[DerivedSite]) -> Result<()> {
    let mut claimed: HashMap<&Path, &str> = HashMap::new();

    for site in sites {
        for (kind, path) in [
            ("data directory", site.hidden_service_dir.as_path()),
            ("socket path", site.socket_path.as_path()),
            ("web root", site.web_root.as_path()),
        ] {
            match claimed.get(path) {
                Some(owner) if *owner != site.name => {
                    return Err(Error::ConflictingPaths {
                        kind,
                        path: path.to_path_buf(),
                        first: owner.to_string(),
                        second: site.name.clone(),
                    });
                }
                Some(_) => {
                    return Err(Error::InvalidSpec(format!(
                        "site '{}' uses {} for more than one purpose",
                        site.name,
                        path.display()
                    )));
                }
                None => {
                    claimed.insert(path, &site.name);
                }
            }
        }
    }

    Ok(())
}

/// True if either path is equal to or below the other
fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn check_nesting(sites: &[DerivedSite], tor_data_root: &Path) -> Result<()> {
    for (i, site) in sites.iter().enumerate() {
        // Every data directory lives below the data root, so this also
        // keeps web roots clear of each site's onion keys
        if overlaps(&site.web_root, tor_data_root) {
            return Err(Error::InvalidSpec(format!(
                "site '{}': web root {} overlaps the Tor data root {}",
                site.name,
                site.web_root.display(),
                tor_data_root.display()
            )));
        }

        if site.socket_path.starts_with(tor_data_root) {
            return Err(Error::InvalidSpec(format!(
                "site '{}': socket {} is inside the Tor data root {}",
                site.name,
                site.socket_path.display(),
                tor_data_root.display()
            )));
        }

        for other in &sites[i + 1..] {
            if overlaps(&site.web_root, &other.web_root) {
                let (outer, inner) = if other.web_root.starts_with(&site.web_root) {
                    (site, other)
                } else {
                    (other, site)
                };
                return Err(Error::ConflictingPaths {
                    kind: "web root",
                    path: inner.web_root.clone(),
                    first: outer.name.clone(),
                    second: inner.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SiteDecl, SitesConfig};

    fn config_with(sites: &[(&str, SiteDecl)]) -> SitesConfig {
        let mut config = SitesConfig::new();
        for (name, decl) in sites {
            config.add_site(*name, decl.clone());
        }
        config
    }

    #[test]
    fn test_default_path_derivation() {
        let set = config_with(&[("blog", SiteDecl::default())]).resolve().unwrap();
        let state = derive_state(&set).unwrap();

        let blog = state.site("blog").unwrap();
        assert_eq!(blog.web_root, PathBuf::from("/var/www/blog"));
        assert_eq!(
            blog.socket_path,
            PathBuf::from("/run/onion-sites/sockets/blog.sock")
        );
        assert_eq!(
            blog.hidden_service_dir,
            PathBuf::from("/var/lib/tor/onion/blog")
        );
        assert_eq!(
            blog.hostname_path(),
            PathBuf::from("/var/lib/tor/onion/blog/hostname")
        );
        assert_eq!(state.socket_dir, PathBuf::from("/run/onion-sites/sockets"));
    }

    #[test]
    fn test_derive_is_deterministic() {
        let config = config_with(&[
            ("b", SiteDecl::default()),
            ("a", SiteDecl::default()),
        ]);
        let first = derive_state(&config.resolve().unwrap()).unwrap();
        let second = derive_state(&config.resolve().unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sites[0].name, "a");
    }

    #[test]
    fn test_multi_site_paths_disjoint() {
        let set = config_with(&[
            ("blog", SiteDecl::default()),
            ("shop", SiteDecl::default()),
        ])
        .resolve()
        .unwrap();
        let sites = derive_sites(&set).unwrap();

        let (a, b) = (&sites[0], &sites[1]);
        assert_ne!(a.hidden_service_dir, b.hidden_service_dir);
        assert_ne!(a.socket_path, b.socket_path);
        assert_ne!(a.web_root, b.web_root);
        assert!(!a.web_root.starts_with(&b.web_root));
        assert!(!b.web_root.starts_with(&a.web_root));
    }

    #[test]
    fn test_duplicate_socket_rejected() {
        let shared = SiteDecl {
            socket_path: Some(PathBuf::from("/run/x/shared.sock")),
            ..SiteDecl::default()
        };
        let result = config_with(&[("a", shared.clone()), ("b", shared)]).resolve();

        match result {
            Err(Error::ConflictingPaths {
                kind, first, second, ..
            }) => {
                assert_eq!(kind, "socket path");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected ConflictingPaths, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_web_root_rejected() {
        let result = config_with(&[
            ("blog", SiteDecl::default()),
            (
                "mirror",
                SiteDecl {
                    web_root: Some(PathBuf::from("/var/www/blog")),
                    ..SiteDecl::default()
                },
            ),
        ])
        .resolve();
        assert!(matches!(result, Err(Error::ConflictingPaths { kind: "web root", .. })));
    }

    #[test]
    fn test_same_site_path_reuse_rejected() {
        let result = config_with(&[(
            "a",
            SiteDecl {
                web_root: Some(PathBuf::from("/srv/a")),
                socket_path: Some(PathBuf::from("/srv/a")),
                create_default_site: false,
            },
        )])
        .resolve();
        assert!(matches!(result, Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_web_root_over_data_root_rejected() {
        for web_root in ["/var/lib/tor/onion", "/var/lib/tor", "/var/lib/tor/onion/blog/www"] {
            let result = config_with(&[
                ("blog", SiteDecl::default()),
                (
                    "mirror",
                    SiteDecl {
                        web_root: Some(PathBuf::from(web_root)),
                        ..SiteDecl::default()
                    },
                ),
            ])
            .resolve();
            assert!(
                matches!(result, Err(Error::InvalidSpec(_))),
                "web root {} should be rejected",
                web_root
            );
        }
    }

    #[test]
    fn test_web_root_enclosing_own_data_dir_rejected() {
        let mut config = config_with(&[(
            "blog",
            SiteDecl {
                web_root: Some(PathBuf::from("/var/lib")),
                ..SiteDecl::default()
            },
        )]);
        assert!(matches!(config.resolve(), Err(Error::InvalidSpec(_))));

        // Fine once the data root moves elsewhere
        config.layout.tor_data_root = PathBuf::from("/srv/tor/onion");
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_nested_web_roots_rejected() {
        let result = config_with(&[
            (
                "inner",
                SiteDecl {
                    web_root: Some(PathBuf::from("/var/www/outer/inner")),
                    ..SiteDecl::default()
                },
            ),
            ("outer", SiteDecl::default()),
        ])
        .resolve();

        match result {
            Err(Error::ConflictingPaths {
                kind,
                path,
                first,
                second,
            }) => {
                assert_eq!(kind, "web root");
                assert_eq!(path, PathBuf::from("/var/www/outer/inner"));
                assert_eq!(first, "outer");
                assert_eq!(second, "inner");
            }
            other => panic!("expected ConflictingPaths, got {:?}", other),
        }
    }

    #[test]
    fn test_sibling_prefix_is_not_nesting() {
        let set = config_with(&[
            ("a", SiteDecl::default()),
            (
                "b",
                SiteDecl {
                    web_root: Some(PathBuf::from("/var/www/ab")),
                    ..SiteDecl::default()
                },
            ),
        ])
        .resolve();
        assert!(set.is_ok());
    }

    #[test]
    fn test_socket_in_data_root_rejected() {
        let result = config_with(&[(
            "blog",
            SiteDecl {
                socket_path: Some(PathBuf::from("/var/lib/tor/onion/blog.sock")),
                ..SiteDecl::default()
            },
        )])
        .resolve();
        assert!(matches!(result, Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_empty_set_derives_empty_state() {
        let set = SitesConfig::default().resolve().unwrap();
        let state = derive_state(&set).unwrap();
        assert!(state.sites.is_empty());
        assert!(state.onion.services.is_empty());
        assert!(state.vhosts.hosts.is_empty());
    }
}
