//! Ls command: list stored objects under a task's output.

use anyhow::Result;
use colored::Colorize;

use super::{build_env, parse_task};
use crate::config::Config;

pub fn execute(config: &Config, name: &str, params: &[String]) -> Result<()> {
    let env = build_env(config)?;
    let task = parse_task(name, params)?;

    let dir = env.tracker.locator().output_dir(&task);
    let keys = env.store.list(&dir)?;

    if keys.is_empty() {
        println!("No objects under {}", dir.bold());
        return Ok(());
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}
