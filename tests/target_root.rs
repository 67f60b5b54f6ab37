// tests/target_root.rs

//! Integration tests for provisioning into a target root.
//!
//! Every test provisions into a temporary directory through the real
//! filesystem backend, with service accounts resolved from the target's
//! own /etc/passwd and /etc/group.

mod common;

use common::{TWO_SITES, mode_of, setup_target_root, site_set};
use onionsite::{Error, HostFilesystem, Provisioner, plan_provisioning};
use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};

#[test]
fn test_apply_creates_layout() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let set = site_set(TWO_SITES);

    let mut fs = HostFilesystem::new(root);
    let report = Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap();

    assert!(root.join("run/onion-sites/sockets").is_dir());
    assert!(root.join("var/lib/tor/onion/blog").is_dir());
    assert!(root.join("var/lib/tor/onion/shop").is_dir());
    assert!(root.join("var/www/blog/index.html").is_file());
    assert!(root.join("var/www/blog/styles.css").is_file());
    assert!(root.join("srv/shop").is_dir());
    assert!(!root.join("srv/shop/index.html").exists());

    // socket dir, two data dirs, two web roots, two placeholder files
    assert_eq!(report.created.len(), 7);
}

#[test]
fn test_apply_permissions() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let set = site_set(TWO_SITES);

    let mut fs = HostFilesystem::new(root);
    Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap();

    assert_eq!(mode_of(root, "/run/onion-sites/sockets"), 0o755);
    assert_eq!(mode_of(root, "/var/lib/tor/onion/blog"), 0o700);
    assert_eq!(mode_of(root, "/var/lib/tor/onion/shop"), 0o700);
    assert_eq!(mode_of(root, "/var/www/blog"), 0o755);
    assert_eq!(mode_of(root, "/var/www/blog/index.html"), 0o644);
    assert_eq!(mode_of(root, "/var/www/blog/styles.css"), 0o644);

    let (uid, gid) = common::current_ids();
    let meta = fs::metadata(root.join("var/lib/tor/onion/blog")).unwrap();
    assert_eq!((meta.uid(), meta.gid()), (uid, gid));
}

#[test]
fn test_apply_is_idempotent_on_disk() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let set = site_set(TWO_SITES);
    let plan = plan_provisioning(&set).unwrap();

    let mut fs = HostFilesystem::new(root);
    Provisioner::new(&mut fs).execute(&plan).unwrap();
    let index = fs::read(root.join("var/www/blog/index.html")).unwrap();

    let report = Provisioner::new(&mut fs).execute(&plan).unwrap();
    assert!(report.is_noop());
    assert_eq!(fs::read(root.join("var/www/blog/index.html")).unwrap(), index);
    assert_eq!(mode_of(root, "/var/lib/tor/onion/blog"), 0o700);
}

#[test]
fn test_operator_content_survives() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let web_root = root.join("var/www/blog");
    fs::create_dir_all(&web_root).unwrap();
    fs::write(web_root.join("index.html"), "<h1>my own page</h1>").unwrap();

    let set = site_set(TWO_SITES);
    let mut fs = HostFilesystem::new(root);
    Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap();

    assert_eq!(
        fs::read_to_string(web_root.join("index.html")).unwrap(),
        "<h1>my own page</h1>"
    );
    assert!(web_root.join("styles.css").is_file());
}

#[test]
fn test_web_root_tree_normalized() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let assets = root.join("srv/shop/assets");
    fs::create_dir_all(&assets).unwrap();
    fs::write(assets.join("logo.svg"), "<svg/>").unwrap();

    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(&assets, fs::Permissions::from_mode(0o700)).unwrap();
    fs::set_permissions(assets.join("logo.svg"), fs::Permissions::from_mode(0o600)).unwrap();

    let set = site_set(TWO_SITES);
    let mut fs = HostFilesystem::new(root);
    Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap();

    assert_eq!(mode_of(root, "/srv/shop/assets"), 0o755);
    assert_eq!(mode_of(root, "/srv/shop/assets/logo.svg"), 0o644);
}

#[test]
fn test_dry_run_leaves_target_untouched() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let set = site_set(TWO_SITES);

    let mut fs = HostFilesystem::new(root);
    let report = Provisioner::new(&mut fs)
        .dry_run(true)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.created.len(), 7);
    assert!(!root.join("run").exists());
    assert!(!root.join("var").exists());
    assert!(!root.join("srv").exists());
}

#[test]
fn test_unknown_identity_aborts() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let set = site_set(
        r#"
enable = true

[identities.web]
user = "www-data"
group = "www-data"

[sites.blog]
"#,
    );

    let mut fs = HostFilesystem::new(root);
    let err = Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap_err();

    assert!(matches!(err, Error::UnknownIdentity(_)));
    // Aborted at the first step, after creating the socket directory
    assert!(root.join("run/onion-sites/sockets").is_dir());
    assert!(!root.join("var/lib/tor/onion/blog").exists());
}

#[test]
fn test_symlinked_data_directory_refused() {
    let temp_dir = setup_target_root();
    let root = temp_dir.path();
    let onion = root.join("var/lib/tor/onion");
    fs::create_dir_all(onion.join("shared")).unwrap();
    fs::set_permissions(onion.join("shared"), fs::Permissions::from_mode(0o755)).unwrap();
    std::os::unix::fs::symlink("shared", onion.join("blog")).unwrap();

    let set = site_set(TWO_SITES);
    let mut fs = HostFilesystem::new(root);
    let err = Provisioner::new(&mut fs)
        .execute(&plan_provisioning(&set).unwrap())
        .unwrap_err();

    assert!(matches!(err, Error::Provisioning { .. }));
    assert!(fs::symlink_metadata(onion.join("blog")).unwrap().file_type().is_symlink());
    assert_eq!(mode_of(root, "/var/lib/tor/onion/shared"), 0o755);
}
