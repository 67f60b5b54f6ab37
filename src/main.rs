// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Validate { config }) => commands::cmd_validate(&config),

        Some(Commands::Render {
            config,
            output_dir,
            json,
        }) => commands::cmd_render(&config, output_dir.as_deref(), json),

        Some(Commands::Plan { config, json }) => commands::cmd_plan(&config, json),

        Some(Commands::Apply {
            config,
            root,
            dry_run,
        }) => commands::cmd_apply(&config, &root, dry_run),

        Some(Commands::Hostnames { config, root }) => commands::cmd_hostnames(&config, &root),

        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "onionsite",
                &mut std::io::stdout(),
            );
            Ok(())
        }

        None => {
            println!("onionsite v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'onionsite --help' for usage information");
            Ok(())
        }
    }
}
