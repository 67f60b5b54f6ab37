// src/filesystem/path.rs

//! Mapping logical paths onto a target root
//!
//! Provisioning can run against `/` or against a mounted system image. Every
//! logical path is re-rooted below the target, and anything that could
//! climb out of it is refused.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Strip the root from an absolute logical path
///
/// `.` components are dropped; `..` components and relative input are
/// rejected, as is the root itself.
///
/// # Examples
///
/// ```
/// use onionsite::filesystem::path::relative_to_root;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     relative_to_root("/var/www/blog").unwrap(),
///     PathBuf::from("var/www/blog")
/// );
/// assert!(relative_to_root("/var/www/../../etc").is_err());
/// assert!(relative_to_root("var/www").is_err());
/// ```
pub fn relative_to_root(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    if !path.is_absolute() {
        return Err(Error::InvalidPath(format!(
            "expected an absolute path, got {}",
            path.display()
        )));
    }

    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path.display().to_string()));
            }
            Component::Prefix(_) => {
                return Err(Error::InvalidPath(format!(
                    "unsupported path prefix in {}",
                    path.display()
                )));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(Error::InvalidPath(
            "refusing to operate on the filesystem root".to_string(),
        ));
    }

    Ok(relative)
}

/// Place a logical absolute path below `root`
///
/// # Examples
///
/// ```
/// use onionsite::filesystem::path::join_under_root;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     join_under_root(Path::new("/mnt/image"), "/var/www/blog").unwrap(),
///     PathBuf::from("/mnt/image/var/www/blog")
/// );
/// assert!(join_under_root(Path::new("/mnt/image"), "/../etc").is_err());
/// ```
pub fn join_under_root(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf> {
    let joined = root.join(relative_to_root(path)?);

    // A symlinked ancestor inside the image could still point outside it
    if let (Ok(real_root), Ok(real_joined)) = (root.canonicalize(), joined.canonicalize())
        && !real_joined.starts_with(&real_root)
    {
        return Err(Error::PathTraversal(format!(
            "{} resolves outside {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}
