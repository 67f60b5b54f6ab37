// src/commands/apply.rs

//! Provisioning execution

use anyhow::{Context, Result};
use onionsite::{plan_provisioning, HostFilesystem, Provisioner};
use std::path::Path;
use tracing::{info, warn};

use super::load_site_set;

/// Provision the filesystem state for a site configuration under `root`
pub fn cmd_apply(config_path: &str, root: &str, dry_run: bool) -> Result<()> {
    let set = load_site_set(config_path)?;
    let plan = plan_provisioning(&set)?;

    if plan.is_empty() {
        println!("Nothing to provision");
        return Ok(());
    }

    let root = Path::new(root);
    if !root.is_dir() {
        return Err(anyhow::anyhow!(
            "Target root {} is not a directory",
            root.display()
        ));
    }
    if !dry_run && !nix::unistd::geteuid().is_root() {
        warn!("Not running as root; changing ownership will likely fail");
    }

    info!(
        "Provisioning {} site(s) under {}",
        set.len(),
        root.display()
    );

    let mut fs = HostFilesystem::new(root);
    let report = Provisioner::new(&mut fs)
        .dry_run(dry_run)
        .execute(&plan)
        .with_context(|| format!("Provisioning under {} failed", root.display()))?;

    let verb = if dry_run { "Would create" } else { "Created" };
    for path in &report.created {
        println!("{} {}", verb, path.display());
    }

    if report.is_noop() {
        println!("Already provisioned, nothing created");
    }
    println!(
        "{} created, {} already present, {} owner and {} mode assertion(s)",
        report.created.len(),
        report.skipped.len(),
        report.owners_asserted,
        report.modes_asserted
    );
    if dry_run {
        println!("Dry run: no changes were made");
    }

    Ok(())
}
