// src/cli.rs
//! CLI definitions for onionsite
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "onionsite")]
#[command(version)]
#[command(about = "Reconcile onion-hosted websites with Tor and nginx", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a site configuration without touching anything
    Validate {
        /// Path to the site configuration
        #[arg(short, long, default_value = "/etc/onionsite/sites.toml")]
        config: String,
    },

    /// Render the Tor and nginx configuration fragments
    Render {
        /// Path to the site configuration
        #[arg(short, long, default_value = "/etc/onionsite/sites.toml")]
        config: String,

        /// Write torrc and nginx.conf into this directory instead of stdout
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Print the derived state as JSON
        #[arg(long, conflicts_with = "output_dir")]
        json: bool,
    },

    /// Show the provisioning plan
    Plan {
        /// Path to the site configuration
        #[arg(short, long, default_value = "/etc/onionsite/sites.toml")]
        config: String,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create directories, permissions and placeholder content
    Apply {
        /// Path to the site configuration
        #[arg(short, long, default_value = "/etc/onionsite/sites.toml")]
        config: String,

        /// Target root directory
        #[arg(short, long, default_value = "/")]
        root: String,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the onion address of each site
    Hostnames {
        /// Path to the site configuration
        #[arg(short, long, default_value = "/etc/onionsite/sites.toml")]
        config: String,

        /// Target root directory
        #[arg(short, long, default_value = "/")]
        root: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
