//! Clean command: delete a task's output, success marker included.

use anyhow::Result;
use colored::Colorize;

use super::{build_env, parse_task};
use crate::config::Config;

pub fn execute(config: &Config, name: &str, params: &[String]) -> Result<()> {
    let env = build_env(config)?;
    let task = parse_task(name, params)?;

    let dir = env.tracker.locator().output_dir(&task);
    let count = env.store.list(&dir)?.len();
    env.tracker.clean_output(&task)?;

    if count == 0 {
        println!("Nothing to clean under {}", dir.bold());
    } else {
        println!(
            "Removed {count} object(s) under {}. Next run will re-execute {}.",
            dir.bold(),
            task.to_string().bold()
        );
    }
    Ok(())
}
