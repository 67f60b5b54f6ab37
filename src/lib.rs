// src/lib.rs

//! Onion Site Reconciler
//!
//! Turns a declarative set of onion-hosted websites into the configuration
//! Tor and nginx need, and into the filesystem state both services expect.
//!
//! # Architecture
//!
//! - Declarative input: one TOML file, resolved into an immutable `SiteSet`
//! - Pure derivation: paths, onion services and virtual hosts are computed
//!   without touching the disk
//! - Plans as data: provisioning is an ordered list of idempotent actions,
//!   executed by an interpreter over a pluggable filesystem
//! - Unix sockets only: Tor forwards port 80 to nginx over a socket, so no
//!   site ever listens on TCP

mod error;
pub mod filesystem;
pub mod hostname;
pub mod identity;
pub mod model;
pub mod provision;
pub mod reconcile;
pub mod render;

pub use error::{Error, Result};
pub use filesystem::{Filesystem, HostFilesystem, MemoryFilesystem};
pub use hostname::read_hostname;
pub use model::{
    load_config, parse_config_file, parse_config_string, SiteDecl, SiteSet, SiteSpec,
    SitesConfig, DEFAULT_CONFIG_PATH,
};
pub use provision::{
    plan_provisioning, ApplyReport, Phase, ProvisioningAction, ProvisioningPlan, Provisioner,
};
pub use reconcile::{derive_state, DerivedSite, DerivedState};
pub use render::{render_downstream_config, NginxVHostConfig, OnionServiceConfig};
