// src/commands/plan.rs

//! Provisioning plan preview

use anyhow::Result;
use onionsite::{plan_provisioning, Phase};

use super::load_site_set;

/// Print the provisioning plan for a site configuration
pub fn cmd_plan(config_path: &str, json: bool) -> Result<()> {
    let set = load_site_set(config_path)?;
    let plan = plan_provisioning(&set)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("Nothing to provision");
        return Ok(());
    }

    println!("Provisioning plan ({} step(s)):", plan.len());
    for phase in [
        Phase::SocketDirectory,
        Phase::DataDirectory,
        Phase::WebRoot,
        Phase::Placeholder,
    ] {
        let steps: Vec<_> = plan.phase(phase).collect();
        if steps.is_empty() {
            continue;
        }

        println!();
        println!("{}:", phase);
        for step in steps {
            match &step.site {
                Some(site) => println!("  [{}] {}", site, step.action.description()),
                None => println!("  {}", step.action.description()),
            }
        }
    }

    Ok(())
}
