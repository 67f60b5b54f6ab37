// src/filesystem/host.rs

//! The real filesystem, below a target root.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::{lchown, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::path::join_under_root;
use super::{Entry, EntryKind, Filesystem};
use crate::error::{Error, Result};
use crate::identity::IdentityResolver;
use crate::model::Ownership;

/// Filesystem rooted at `/` or at a mounted system image
#[derive(Debug, Clone)]
pub struct HostFilesystem {
    /// Target root (usually "/")
    root: PathBuf,
    identities: IdentityResolver,
}

impl HostFilesystem {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            identities: IdentityResolver::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical location of a logical path
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        join_under_root(&self.root, path)
    }

    fn metadata(&self, path: &Path) -> Option<fs::Metadata> {
        self.resolve(path)
            .ok()
            .and_then(|p| fs::symlink_metadata(p).ok())
    }
}

impl Filesystem for HostFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.metadata(path).is_some_and(|m| m.is_dir())
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.metadata(path).is_some_and(|m| m.file_type().is_symlink())
    }

    fn mode(&self, path: &Path) -> Result<u32> {
        let target = self.resolve(path)?;
        let meta = fs::symlink_metadata(&target)?;
        Ok(meta.permissions().mode() & 0o7777)
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<bool> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&target)?;
        debug!("Created directory {}", target.display());
        Ok(true)
    }

    fn set_mode(&mut self, path: &Path, mode: u32) -> Result<()> {
        let target = self.resolve(path)?;
        fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn set_owner(&mut self, path: &Path, owner: &Ownership) -> Result<()> {
        let target = self.resolve(path)?;
        let uid = self.identities.uid(&owner.user)?;
        let gid = self.identities.gid(&owner.group)?;
        lchown(&target, Some(uid), Some(gid))?;
        Ok(())
    }

    fn write_new(&mut self, path: &Path, contents: &[u8]) -> Result<bool> {
        let target = self.resolve(path)?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(true)
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        let target = self.resolve(path)?;
        match fs::read_to_string(&target) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn walk(&self, path: &Path) -> Result<Vec<Entry>> {
        let base = self.resolve(path)?;
        let mut entries = Vec::new();

        for entry in WalkDir::new(&base).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other(format!("walk failed below {}", base.display()))
                }))
            })?;

            let relative = entry
                .path()
                .strip_prefix(&base)
                .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            entries.push(Entry {
                path: if relative.as_os_str().is_empty() {
                    path.to_path_buf()
                } else {
                    path.join(relative)
                },
                kind,
            });
        }

        Ok(entries)
    }
}
