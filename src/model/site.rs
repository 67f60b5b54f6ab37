// src/model/site.rs

//! Resolved site specifications and name/path validation.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

use super::parser::{Layout, SiteDecl};

/// Longest accepted site name
pub const MAX_SITE_NAME_LEN: usize = 64;

/// A site with every default applied
///
/// Paths are fixed at construction and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSpec {
    name: String,
    web_root: PathBuf,
    socket_path: PathBuf,
    create_default_site: bool,
}

impl SiteSpec {
    /// Resolve a declaration against the layout, validating name and paths
    pub fn resolve(name: &str, decl: &SiteDecl, layout: &Layout) -> Result<Self> {
        validate_site_name(name)?;

        let web_root = match &decl.web_root {
            Some(path) => {
                validate_config_path(&format!("site '{}': web_root", name), path)?;
                path.clone()
            }
            None => layout.default_web_root(name),
        };

        let socket_path = match &decl.socket_path {
            Some(path) => {
                validate_config_path(&format!("site '{}': socket_path", name), path)?;
                path.clone()
            }
            None => layout.default_socket_path(name),
        };

        Ok(Self {
            name: name.to_string(),
            web_root,
            socket_path,
            create_default_site: decl.create_default_site,
        })
    }

    /// Resolve a site that declares nothing but its name
    pub fn with_defaults(name: &str, layout: &Layout) -> Result<Self> {
        Self::resolve(name, &SiteDecl::default(), layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn create_default_site(&self) -> bool {
        self.create_default_site
    }
}

/// Check that a site name is usable as a path component and a service name
///
/// Accepted names are ASCII letters, digits, `.`, `_` and `-`, do not start
/// with `.` or `-`, and are at most [`MAX_SITE_NAME_LEN`] bytes long.
pub fn validate_site_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSpec("site name is empty".to_string()));
    }

    if name.len() > MAX_SITE_NAME_LEN {
        return Err(Error::InvalidSpec(format!(
            "site name '{}' is longer than {} characters",
            name, MAX_SITE_NAME_LEN
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(Error::InvalidSpec(format!(
            "site name '{}' contains unsupported character {:?}",
            name, bad
        )));
    }

    if name.starts_with('.') || name.starts_with('-') {
        return Err(Error::InvalidSpec(format!(
            "site name '{}' must not start with '.' or '-'",
            name
        )));
    }

    Ok(())
}

/// Characters that would break a torrc line or an nginx directive
fn is_unsafe_config_char(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, ';' | '"' | '\'' | '{' | '}' | '#' | '\\')
}

/// Check a configured path
///
/// It must be absolute, free of `.`/`..` components, and safe to
/// interpolate unquoted into torrc and nginx configuration. `field` names
/// the setting in error messages.
pub(crate) fn validate_config_path(field: &str, path: &Path) -> Result<()> {
    let display = path.display().to_string();

    if !path.is_absolute() {
        return Err(Error::InvalidSpec(format!(
            "{} '{}' must be absolute",
            field,
            display.escape_debug()
        )));
    }

    for component in path.components() {
        match component {
            Component::RootDir | Component::Normal(_) => {}
            _ => {
                return Err(Error::InvalidSpec(format!(
                    "{} '{}' must not contain '.' or '..'",
                    field,
                    display.escape_debug()
                )));
            }
        }
    }

    if path.parent().is_none() {
        return Err(Error::InvalidSpec(format!(
            "{} must not be the filesystem root",
            field
        )));
    }

    if display.chars().any(is_unsafe_config_char) {
        return Err(Error::InvalidSpec(format!(
            "{} '{}' contains whitespace or config metacharacters",
            field,
            display.escape_debug()
        )));
    }

    Ok(())
}
