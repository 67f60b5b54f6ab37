// src/filesystem/mod.rs

//! Filesystem access for provisioning
//!
//! Provisioning talks to the filesystem only through the [`Filesystem`]
//! trait, which has two implementations:
//! - [`HostFilesystem`]: the real disk, optionally below a target root
//! - [`MemoryFilesystem`]: an in-memory tree for tests and previews
//!
//! All paths passed to the trait are logical absolute paths such as
//! `/var/www/blog`, regardless of where the target root is mounted.

mod host;
mod memory;
pub mod path;

pub use host::HostFilesystem;
pub use memory::{MemoryFilesystem, MemoryNode};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Ownership;

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// An entry returned by [`Filesystem::walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Operations provisioning needs from a filesystem
pub trait Filesystem {
    /// Check whether anything exists at `path` (symlinks are not followed)
    fn exists(&self, path: &Path) -> bool;

    /// Check whether `path` is a directory (symlinks are not followed)
    fn is_dir(&self, path: &Path) -> bool;

    /// Check whether `path` itself is a symbolic link
    fn is_symlink(&self, path: &Path) -> bool;

    /// Permission bits of `path` (lower 12 bits)
    fn mode(&self, path: &Path) -> Result<u32>;

    /// Create a directory and any missing parents.
    /// Returns true if `path` itself was created.
    fn create_dir_all(&mut self, path: &Path) -> Result<bool>;

    fn set_mode(&mut self, path: &Path, mode: u32) -> Result<()>;

    /// Change owner and group; symlinks are changed themselves, not followed
    fn set_owner(&mut self, path: &Path, owner: &Ownership) -> Result<()>;

    /// Create a file with `contents` only if nothing exists at `path`.
    /// Returns true if the file was written.
    fn write_new(&mut self, path: &Path, contents: &[u8]) -> Result<bool>;

    /// Read a file as UTF-8, or `None` if it does not exist
    fn read_to_string(&self, path: &Path) -> Result<Option<String>>;

    /// `path` and everything below it, parents before children
    fn walk(&self, path: &Path) -> Result<Vec<Entry>>;
}
