// src/identity.rs

//! Service identity resolution
//!
//! Ownership in the configuration is written as user and group names (or
//! raw numeric ids). On the live system names are looked up through the
//! system user database; for a target root the image's own `/etc/passwd`
//! and `/etc/group` are read so the host's accounts never leak in.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves user and group names to numeric ids
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    root: PathBuf,
}

impl IdentityResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Check if we're resolving against the running system
    pub fn is_live_root(&self) -> bool {
        self.root == Path::new("/")
    }

    /// Resolve a user name or numeric uid
    pub fn uid(&self, user: &str) -> Result<u32> {
        if let Ok(id) = user.parse::<u32>() {
            return Ok(id);
        }

        let found = if self.is_live_root() {
            nix::unistd::User::from_name(user)
                .map_err(|e| Error::UnknownIdentity(format!("user '{}': {}", user, e)))?
                .map(|u| u.uid.as_raw())
        } else {
            self.lookup_in_target("etc/passwd", user)?
        };

        found.ok_or_else(|| Error::UnknownIdentity(format!("user '{}' does not exist", user)))
    }

    /// Resolve a group name or numeric gid
    pub fn gid(&self, group: &str) -> Result<u32> {
        if let Ok(id) = group.parse::<u32>() {
            return Ok(id);
        }

        let found = if self.is_live_root() {
            nix::unistd::Group::from_name(group)
                .map_err(|e| Error::UnknownIdentity(format!("group '{}': {}", group, e)))?
                .map(|g| g.gid.as_raw())
        } else {
            self.lookup_in_target("etc/group", group)?
        };

        found.ok_or_else(|| Error::UnknownIdentity(format!("group '{}' does not exist", group)))
    }

    /// Find the id column (third field) for `name` in a passwd/group style file
    fn lookup_in_target(&self, database: &str, name: &str) -> Result<Option<u32>> {
        let path = self.root.join(database);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            let mut fields = line.split(':');
            if fields.next() != Some(name) {
                continue;
            }
            let id = fields.nth(1).and_then(|f| f.trim().parse::<u32>().ok());
            return match id {
                Some(id) => Ok(Some(id)),
                None => Err(Error::UnknownIdentity(format!(
                    "malformed entry for '{}' in {}",
                    name,
                    path.display()
                ))),
            };
        }

        Ok(None)
    }
}
