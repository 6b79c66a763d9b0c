//! Info command: print the recorded run metadata for a task.

use anyhow::{Context, Result};
use colored::Colorize;

use super::{build_env, parse_task};
use crate::config::Config;

pub fn execute(config: &Config, name: &str, params: &[String]) -> Result<()> {
    let env = build_env(config)?;
    let task = parse_task(name, params)?;

    let info = env.tracker.run_info(&task)?;
    let json = serde_json::to_string_pretty(&info).context("Failed to render run metadata")?;

    println!("{}", task.to_string().bold());
    println!("{json}");
    Ok(())
}
