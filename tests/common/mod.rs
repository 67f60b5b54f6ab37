// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use onionsite::{SiteSet, parse_config_string};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Numeric uid and gid of the user running the tests
pub fn current_ids() -> (u32, u32) {
    (
        nix::unistd::getuid().as_raw(),
        nix::unistd::getgid().as_raw(),
    )
}

/// Create a target root whose `tor` and `nginx` accounts map to the
/// current user, so ownership changes succeed without privileges.
///
/// Returns the TempDir - keep it alive to prevent cleanup.
pub fn setup_target_root() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let (uid, gid) = current_ids();

    let etc = temp_dir.path().join("etc");
    fs::create_dir_all(&etc).unwrap();
    fs::write(
        etc.join("passwd"),
        format!(
            "root:x:0:0:root:/root:/bin/sh\n\
             tor:x:{uid}:{gid}:Tor:/var/lib/tor:/sbin/nologin\n\
             nginx:x:{uid}:{gid}:nginx:/var/empty:/sbin/nologin\n"
        ),
    )
    .unwrap();
    fs::write(
        etc.join("group"),
        format!("root:x:0:\ntor:x:{gid}:\nnginx:x:{gid}:\n"),
    )
    .unwrap();

    temp_dir
}

/// Resolve a TOML site configuration, panicking on errors
pub fn site_set(toml: &str) -> SiteSet {
    parse_config_string(toml).unwrap().resolve().unwrap()
}

/// Permission bits of a path inside the target root
pub fn mode_of(root: &Path, logical: &str) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(root.join(logical.trim_start_matches('/')))
        .unwrap()
        .permissions()
        .mode()
        & 0o7777
}

/// Two sites: `blog` with placeholders and defaults, `shop` with explicit paths
pub const TWO_SITES: &str = r#"
enable = true

[sites.blog]
create_default_site = true

[sites.shop]
web_root = "/srv/shop"
socket_path = "/run/onion-sites/sockets/shop-main.sock"
"#;
