// src/provision/mod.rs

//! Provisioning plans
//!
//! A [`ProvisioningPlan`] is the ordered list of filesystem actions that
//! realize a [`SiteSet`] on disk. Plans are plain data: they can be
//! printed, serialized, or handed to a [`Provisioner`] for execution.
//!
//! Steps are grouped into four phases that always run in this order:
//!
//! 1. [`Phase::SocketDirectory`] - shared socket directory, web identity, 0755
//! 2. [`Phase::DataDirectory`] - per-site onion data directory, Tor identity, 0700
//! 3. [`Phase::WebRoot`] - per-site web root, web identity, readable tree
//! 4. [`Phase::Placeholder`] - per-site placeholder files, only when absent
//!
//! Every action is idempotent; running the same plan twice leaves the disk
//! exactly as the first run did.

mod executor;
pub mod templates;

pub use executor::{ApplyReport, Provisioner};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::model::{Ownership, SiteSet};
use crate::reconcile::derive_sites;

/// Mode of the shared socket directory
pub const SOCKET_DIR_MODE: u32 = 0o755;

/// Mode of each onion data directory; guards the service's private key
pub const DATA_DIR_MODE: u32 = 0o700;

/// Mode of directories inside a web root
pub const WEB_DIR_MODE: u32 = 0o755;

/// Mode of generated placeholder files
pub const PLACEHOLDER_FILE_MODE: u32 = 0o644;

/// Provisioning phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SocketDirectory,
    DataDirectory,
    WebRoot,
    Placeholder,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SocketDirectory => "socket-directory",
            Phase::DataDirectory => "data-directory",
            Phase::WebRoot => "web-root",
            Phase::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a `SetMode` action computes permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "mode", rename_all = "snake_case")]
pub enum ModeSpec {
    /// The same bits on every entry
    Exact(u32),
    /// Directories get the given mode; files become `u=rwX,go=rX`
    Readable(u32),
}

impl ModeSpec {
    /// Mode an entry should end up with
    pub fn mode_for(&self, is_dir: bool, current: u32) -> u32 {
        match *self {
            ModeSpec::Exact(mode) => mode,
            ModeSpec::Readable(dir_mode) if is_dir => dir_mode,
            ModeSpec::Readable(_) => {
                if current & 0o111 != 0 {
                    0o755
                } else {
                    0o644
                }
            }
        }
    }
}

impl fmt::Display for ModeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeSpec::Exact(mode) => write!(f, "{:04o}", mode),
            ModeSpec::Readable(mode) => write!(f, "dirs {:04o}, files u=rwX,go=rX", mode),
        }
    }
}

/// A single filesystem action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProvisioningAction {
    /// Create a directory (and missing parents) if it does not exist
    CreateDirectory { path: PathBuf },

    /// Assert ownership, optionally over the whole subtree
    SetOwner {
        path: PathBuf,
        owner: Ownership,
        recursive: bool,
    },

    /// Assert permissions, optionally over the whole subtree
    SetMode {
        path: PathBuf,
        mode: ModeSpec,
        recursive: bool,
    },

    /// Create a file with fixed contents unless something is already there
    WriteFileIfAbsent {
        path: PathBuf,
        contents: String,
        owner: Ownership,
        mode: u32,
    },
}

impl ProvisioningAction {
    /// Path this action operates on
    pub fn path(&self) -> &std::path::Path {
        match self {
            ProvisioningAction::CreateDirectory { path } => path,
            ProvisioningAction::SetOwner { path, .. } => path,
            ProvisioningAction::SetMode { path, .. } => path,
            ProvisioningAction::WriteFileIfAbsent { path, .. } => path,
        }
    }

    /// Short name of the action kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisioningAction::CreateDirectory { .. } => "create-directory",
            ProvisioningAction::SetOwner { .. } => "set-owner",
            ProvisioningAction::SetMode { .. } => "set-mode",
            ProvisioningAction::WriteFileIfAbsent { .. } => "write-file-if-absent",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            ProvisioningAction::CreateDirectory { path } => {
                format!("Create directory {}", path.display())
            }
            ProvisioningAction::SetOwner {
                path,
                owner,
                recursive,
            } => {
                let mut desc = format!("Set owner of {} to {}", path.display(), owner);
                if *recursive {
                    desc.push_str(" (recursive)");
                }
                desc
            }
            ProvisioningAction::SetMode {
                path,
                mode,
                recursive,
            } => {
                let mut desc = format!("Set mode of {} to {}", path.display(), mode);
                if *recursive {
                    desc.push_str(" (recursive)");
                }
                desc
            }
            ProvisioningAction::WriteFileIfAbsent {
                path, owner, mode, ..
            } => format!(
                "Write {} if absent ({}, {:04o})",
                path.display(),
                owner,
                mode
            ),
        }
    }
}

/// An action with the phase and site it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub phase: Phase,
    /// `None` for steps shared by all sites
    pub site: Option<String>,
    pub action: ProvisioningAction,
}

impl PlanStep {
    /// Label used in logs and errors
    pub fn label(&self) -> String {
        match &self.site {
            Some(site) => format!("{}/{}: {}", self.phase, site, self.action.kind()),
            None => format!("{}: {}", self.phase, self.action.kind()),
        }
    }
}

/// The ordered list of steps for a site set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningPlan {
    pub steps: Vec<PlanStep>,
}

impl ProvisioningPlan {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Steps belonging to one phase
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    /// Steps belonging to one site
    pub fn for_site<'a>(&'a self, site: &'a str) -> impl Iterator<Item = &'a PlanStep> {
        self.steps
            .iter()
            .filter(move |s| s.site.as_deref() == Some(site))
    }

    fn push(&mut self, phase: Phase, site: Option<&str>, action: ProvisioningAction) {
        self.steps.push(PlanStep {
            phase,
            site: site.map(str::to_string),
            action,
        });
    }
}

/// Compute the provisioning plan for a site set
///
/// An empty set (including a disabled configuration) yields an empty plan.
pub fn plan_provisioning(set: &SiteSet) -> Result<ProvisioningPlan> {
    let sites = derive_sites(set)?;
    let mut plan = ProvisioningPlan::new();

    if sites.is_empty() {
        return Ok(plan);
    }

    let identities = set.identities();

    // 1. Shared socket directory
    let socket_dir = set.layout().socket_dir();
    plan.push(
        Phase::SocketDirectory,
        None,
        ProvisioningAction::CreateDirectory {
            path: socket_dir.clone(),
        },
    );
    plan.push(
        Phase::SocketDirectory,
        None,
        ProvisioningAction::SetOwner {
            path: socket_dir.clone(),
            owner: identities.web.clone(),
            recursive: false,
        },
    );
    plan.push(
        Phase::SocketDirectory,
        None,
        ProvisioningAction::SetMode {
            path: socket_dir,
            mode: ModeSpec::Exact(SOCKET_DIR_MODE),
            recursive: false,
        },
    );

    // 2. Onion data directories
    for site in &sites {
        let dir = &site.hidden_service_dir;
        let name = Some(site.name.as_str());
        plan.push(
            Phase::DataDirectory,
            name,
            ProvisioningAction::CreateDirectory { path: dir.clone() },
        );
        plan.push(
            Phase::DataDirectory,
            name,
            ProvisioningAction::SetOwner {
                path: dir.clone(),
                owner: identities.tor.clone(),
                recursive: false,
            },
        );
        plan.push(
            Phase::DataDirectory,
            name,
            ProvisioningAction::SetMode {
                path: dir.clone(),
                mode: ModeSpec::Exact(DATA_DIR_MODE),
                recursive: false,
            },
        );
    }

    // 3. Web roots
    for site in &sites {
        let root = &site.web_root;
        let name = Some(site.name.as_str());
        plan.push(
            Phase::WebRoot,
            name,
            ProvisioningAction::CreateDirectory { path: root.clone() },
        );
        plan.push(
            Phase::WebRoot,
            name,
            ProvisioningAction::SetOwner {
                path: root.clone(),
                owner: identities.web.clone(),
                recursive: true,
            },
        );
        plan.push(
            Phase::WebRoot,
            name,
            ProvisioningAction::SetMode {
                path: root.clone(),
                mode: ModeSpec::Readable(WEB_DIR_MODE),
                recursive: true,
            },
        );
    }

    // 4. Placeholder content
    for site in sites.iter().filter(|s| s.create_default_site) {
        let name = Some(site.name.as_str());
        plan.push(
            Phase::Placeholder,
            name,
            ProvisioningAction::WriteFileIfAbsent {
                path: site.web_root.join(templates::INDEX_FILE),
                contents: templates::index_html(&site.name),
                owner: identities.web.clone(),
                mode: PLACEHOLDER_FILE_MODE,
            },
        );
        plan.push(
            Phase::Placeholder,
            name,
            ProvisioningAction::WriteFileIfAbsent {
                path: site.web_root.join(templates::STYLESHEET_FILE),
                contents: templates::STYLES_CSS.to_string(),
                owner: identities.web.clone(),
                mode: PLACEHOLDER_FILE_MODE,
            },
        );
    }

    Ok(plan)
}
