// src/filesystem/memory.rs

//! In-memory filesystem
//!
//! A flat map from absolute path to node. Used by tests to observe exactly
//! what provisioning did, and to inject failures at chosen paths.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use super::{Entry, EntryKind, Filesystem};
use crate::error::{Error, Result};
use crate::model::Ownership;

/// Mode given to directories created implicitly
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Mode given to newly written files
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Content of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNode {
    Directory,
    File(Vec<u8>),
    /// Link target; never followed
    Symlink(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    content: MemoryNode,
    mode: u32,
    /// `None` means untouched since creation (root-owned)
    owner: Option<Ownership>,
}

/// Flat in-memory tree keyed by absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFilesystem {
    nodes: BTreeMap<PathBuf, Node>,
    /// Paths at or below which every mutation fails with PermissionDenied
    read_only: BTreeSet<PathBuf>,
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystem {
    /// Create a filesystem containing only `/`
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node {
                content: MemoryNode::Directory,
                mode: DEFAULT_DIR_MODE,
                owner: None,
            },
        );
        Self {
            nodes,
            read_only: BTreeSet::new(),
        }
    }

    /// Seed a file, creating parent directories as needed
    pub fn insert_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>, mode: u32) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.mkdir_p(parent);
        }
        self.nodes.insert(
            path.to_path_buf(),
            Node {
                content: MemoryNode::File(contents.into()),
                mode,
                owner: None,
            },
        );
    }

    /// Seed a symbolic link, creating parent directories as needed
    pub fn insert_symlink(&mut self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.mkdir_p(parent);
        }
        self.nodes.insert(
            path.to_path_buf(),
            Node {
                content: MemoryNode::Symlink(target.into()),
                mode: 0o777,
                owner: None,
            },
        );
    }

    /// Make every mutation at or below `path` fail
    pub fn deny_writes(&mut self, path: impl Into<PathBuf>) {
        self.read_only.insert(path.into());
    }

    pub fn node(&self, path: impl AsRef<Path>) -> Option<&MemoryNode> {
        self.nodes.get(path.as_ref()).map(|n| &n.content)
    }

    pub fn owner(&self, path: impl AsRef<Path>) -> Option<&Ownership> {
        self.nodes.get(path.as_ref()).and_then(|n| n.owner.as_ref())
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        match self.nodes.get(path.as_ref()).map(|n| &n.content) {
            Some(MemoryNode::File(data)) => Some(data.as_slice()),
            _ => None,
        }
    }

    /// All paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.nodes.keys().map(|p| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn mkdir_p(&mut self, path: &Path) -> bool {
        let mut created = false;
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            if !self.nodes.contains_key(ancestor) {
                self.nodes.insert(
                    ancestor.to_path_buf(),
                    Node {
                        content: MemoryNode::Directory,
                        mode: DEFAULT_DIR_MODE,
                        owner: None,
                    },
                );
                created = ancestor == path;
            }
        }
        created
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.read_only.iter().any(|p| path.starts_with(p)) {
            return Err(Error::Io(IoError::new(
                ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            )));
        }
        Ok(())
    }

    fn check_absolute(path: &Path) -> Result<()> {
        if !path.is_absolute() {
            return Err(Error::InvalidPath(format!(
                "expected an absolute path, got {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn node_mut(&mut self, path: &Path) -> Result<&mut Node> {
        self.nodes.get_mut(path).ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> Error {
    Error::Io(IoError::new(
        ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    ))
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.nodes.get(path).map(|n| &n.content),
            Some(MemoryNode::Directory)
        )
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(
            self.nodes.get(path).map(|n| &n.content),
            Some(MemoryNode::Symlink(_))
        )
    }

    fn mode(&self, path: &Path) -> Result<u32> {
        self.nodes
            .get(path)
            .map(|n| n.mode)
            .ok_or_else(|| not_found(path))
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<bool> {
        Self::check_absolute(path)?;
        if self.is_dir(path) {
            return Ok(false);
        }
        if let Some(file) = path
            .ancestors()
            .find(|a| {
                matches!(
                    self.node(a),
                    Some(MemoryNode::File(_) | MemoryNode::Symlink(_))
                )
            })
        {
            return Err(Error::Io(IoError::new(
                ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", file.display()),
            )));
        }
        self.check_writable(path)?;
        Ok(self.mkdir_p(path))
    }

    fn set_mode(&mut self, path: &Path, mode: u32) -> Result<()> {
        self.check_writable(path)?;
        self.node_mut(path)?.mode = mode & 0o7777;
        Ok(())
    }

    fn set_owner(&mut self, path: &Path, owner: &Ownership) -> Result<()> {
        self.check_writable(path)?;
        self.node_mut(path)?.owner = Some(owner.clone());
        Ok(())
    }

    fn write_new(&mut self, path: &Path, contents: &[u8]) -> Result<bool> {
        Self::check_absolute(path)?;
        if self.exists(path) {
            return Ok(false);
        }
        let parent = path.parent().ok_or_else(|| not_found(path))?;
        if !self.is_dir(parent) {
            return Err(not_found(parent));
        }
        self.check_writable(path)?;
        self.nodes.insert(
            path.to_path_buf(),
            Node {
                content: MemoryNode::File(contents.to_vec()),
                mode: DEFAULT_FILE_MODE,
                owner: None,
            },
        );
        Ok(true)
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        match self.nodes.get(path).map(|n| &n.content) {
            None => Ok(None),
            Some(MemoryNode::Directory) => Err(Error::Io(IoError::new(
                ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ))),
            Some(MemoryNode::Symlink(_)) => Err(Error::Io(IoError::new(
                ErrorKind::Unsupported,
                format!("{} is a symlink", path.display()),
            ))),
            Some(MemoryNode::File(data)) => String::from_utf8(data.clone())
                .map(Some)
                .map_err(|e| Error::Io(IoError::new(ErrorKind::InvalidData, e))),
        }
    }

    fn walk(&self, path: &Path) -> Result<Vec<Entry>> {
        if !self.exists(path) {
            return Err(not_found(path));
        }
        // BTreeMap order puts every parent before its children
        Ok(self
            .nodes
            .iter()
            .filter(|(p, _)| p.starts_with(path))
            .map(|(p, n)| Entry {
                path: p.clone(),
                kind: match n.content {
                    MemoryNode::Directory => EntryKind::Directory,
                    MemoryNode::File(_) => EntryKind::File,
                    MemoryNode::Symlink(_) => EntryKind::Symlink,
                },
            })
            .collect())
    }
}
