// src/provision/executor.rs

//! Plan execution
//!
//! The [`Provisioner`] walks a [`ProvisioningPlan`] in order and applies each
//! action through a [`Filesystem`]. The first failure aborts the run; steps
//! that already succeeded are left in place.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ModeSpec, PlanStep, ProvisioningAction, ProvisioningPlan};
use crate::error::{Error, Result};
use crate::filesystem::{Entry, EntryKind, Filesystem};
use crate::model::Ownership;

/// Outcome of running a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Nothing was changed; `created` lists what would have been
    pub dry_run: bool,
    /// Directories and files that did not exist before
    pub created: Vec<PathBuf>,
    /// Directories and files left alone because they already existed
    pub skipped: Vec<PathBuf>,
    /// Number of entries whose ownership was asserted
    pub owners_asserted: usize,
    /// Number of entries whose mode was asserted
    pub modes_asserted: usize,
}

impl ApplyReport {
    /// True if the run created nothing
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// Executes provisioning plans against a filesystem
pub struct Provisioner<'a, F: Filesystem> {
    fs: &'a mut F,
    dry_run: bool,
}

impl<'a, F: Filesystem> Provisioner<'a, F> {
    pub fn new(fs: &'a mut F) -> Self {
        Self { fs, dry_run: false }
    }

    /// Report what would happen without touching the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every step of `plan` in order
    pub fn execute(&mut self, plan: &ProvisioningPlan) -> Result<ApplyReport> {
        let mut report = ApplyReport {
            dry_run: self.dry_run,
            ..ApplyReport::default()
        };

        for step in &plan.steps {
            self.execute_step(step, &mut report)
                .map_err(|e| with_step(e, step))?;
        }

        if self.dry_run {
            info!(
                "Dry run: {} path(s) would be created, {} already present",
                report.created.len(),
                report.skipped.len()
            );
        } else {
            info!(
                "Provisioning complete: {} created, {} already present",
                report.created.len(),
                report.skipped.len()
            );
        }

        Ok(report)
    }

    fn execute_step(&mut self, step: &PlanStep, report: &mut ApplyReport) -> Result<()> {
        match &step.action {
            ProvisioningAction::CreateDirectory { path } => {
                // Ownership and modes asserted later would land on the link target
                if self.fs.is_symlink(path) {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("{} is a symbolic link, refusing to manage it", path.display()),
                    )));
                }
                if self.fs.is_dir(path) {
                    debug!("Directory {} already exists", path.display());
                    report.skipped.push(path.clone());
                } else if self.dry_run {
                    info!("Would create directory {}", path.display());
                    report.created.push(path.clone());
                } else if self.fs.create_dir_all(path)? {
                    info!("Created directory {}", path.display());
                    report.created.push(path.clone());
                } else {
                    report.skipped.push(path.clone());
                }
            }

            ProvisioningAction::SetOwner {
                path,
                owner,
                recursive,
            } => {
                for entry in self.targets(path, *recursive)? {
                    if !self.dry_run {
                        self.fs.set_owner(&entry.path, owner)?;
                    }
                    report.owners_asserted += 1;
                }
                debug!("Asserted owner {} on {}", owner, path.display());
            }

            ProvisioningAction::SetMode {
                path,
                mode,
                recursive,
            } => {
                for entry in self.targets(path, *recursive)? {
                    // chmod follows symlinks; leave them alone
                    if entry.kind == EntryKind::Symlink {
                        continue;
                    }
                    if !self.dry_run {
                        self.apply_mode(&entry, mode)?;
                    }
                    report.modes_asserted += 1;
                }
                debug!("Asserted mode {} on {}", mode, path.display());
            }

            ProvisioningAction::WriteFileIfAbsent {
                path,
                contents,
                owner,
                mode,
            } => {
                if self.fs.exists(path) {
                    debug!("{} already exists, leaving it untouched", path.display());
                    report.skipped.push(path.clone());
                } else if self.dry_run {
                    info!("Would write {}", path.display());
                    report.created.push(path.clone());
                } else if self.fs.write_new(path, contents.as_bytes())? {
                    self.finish_new_file(path, owner, *mode)?;
                    report.owners_asserted += 1;
                    report.modes_asserted += 1;
                    info!("Wrote {}", path.display());
                    report.created.push(path.clone());
                } else {
                    report.skipped.push(path.clone());
                }
            }
        }

        Ok(())
    }

    /// Entries an ownership or mode action applies to
    fn targets(&self, path: &Path, recursive: bool) -> Result<Vec<Entry>> {
        // In a dry run the directory may not have been created yet
        if self.dry_run && !self.fs.exists(path) {
            return Ok(vec![Entry {
                path: path.to_path_buf(),
                kind: EntryKind::Directory,
            }]);
        }

        if recursive {
            return self.fs.walk(path);
        }

        let kind = if self.fs.is_symlink(path) {
            EntryKind::Symlink
        } else if self.fs.is_dir(path) {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Ok(vec![Entry {
            path: path.to_path_buf(),
            kind,
        }])
    }

    fn apply_mode(&mut self, entry: &Entry, spec: &ModeSpec) -> Result<()> {
        let current = self.fs.mode(&entry.path)?;
        let wanted = spec.mode_for(entry.kind == EntryKind::Directory, current);
        if current != wanted {
            self.fs.set_mode(&entry.path, wanted)?;
            debug!(
                "Changed mode of {} from {:04o} to {:04o}",
                entry.path.display(),
                current,
                wanted
            );
        }
        Ok(())
    }

    fn finish_new_file(&mut self, path: &Path, owner: &Ownership, mode: u32) -> Result<()> {
        self.fs.set_owner(path, owner)?;
        self.fs.set_mode(path, mode)
    }
}

/// Attach the failing step to filesystem errors
fn with_step(err: Error, step: &PlanStep) -> Error {
    match err {
        Error::Io(source) => Error::provisioning(step.label(), step.action.path(), source),
        other => other,
    }
}
