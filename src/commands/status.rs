//! Status command: show completion state for one task or every tracked task.

use anyhow::Result;
use colored::Colorize;

use super::{build_env, parse_task, Env};
use crate::config::Config;
use crate::locator::SUCCESS_MARKER;
use crate::models::RunInfo;

/// Execute the status command.
///
/// With a task name, reports that task's completion state. Without one,
/// scans the store for success markers and lists every tracked task.
pub fn execute(config: &Config, task: Option<&str>, params: &[String]) -> Result<()> {
    let env = build_env(config)?;
    match task {
        Some(name) => single(&env, name, params),
        None => overview(&env),
    }
}

fn single(env: &Env, name: &str, params: &[String]) -> Result<()> {
    let task = parse_task(name, params)?;
    let completion = env.tracker.check(&task, false)?;

    let state = if completion.is_complete() {
        "Complete".green().bold()
    } else {
        "Incomplete".yellow().bold()
    };
    println!("{task}  {state}");

    if completion.is_complete() {
        match env.tracker.run_info(&task) {
            Ok(info) => print_run_line(&info),
            Err(e) => println!("  {}", format!("run metadata unreadable: {e}").red()),
        }
    }
    Ok(())
}

fn overview(env: &Env) -> Result<()> {
    let suffix = format!("/{SUCCESS_MARKER}");
    let keys = env.store.list(env.prefix.as_deref().unwrap_or(""))?;
    let mut tracked: Vec<&str> = keys
        .iter()
        .filter_map(|key| key.strip_suffix(&suffix))
        .collect();
    tracked.sort_unstable();

    if tracked.is_empty() {
        println!("No completed tasks tracked.");
        return Ok(());
    }

    println!("{}", "Completed tasks".bold());
    for dir in tracked {
        let shown = env
            .prefix
            .as_deref()
            .and_then(|p| dir.strip_prefix(&format!("{p}/")))
            .unwrap_or(dir);
        match read_info(env, dir) {
            Some(info) => println!(
                "  {}  {}",
                shown.green(),
                format!("finished {} ({:.2}s)", info.end, info.elapsed).dimmed()
            ),
            None => println!("  {}  {}", shown.green(), "metadata unreadable".dimmed()),
        }
    }
    Ok(())
}

fn read_info(env: &Env, dir: &str) -> Option<RunInfo> {
    let bytes = env.store.get(&format!("{dir}/{SUCCESS_MARKER}")).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn print_run_line(info: &RunInfo) {
    println!(
        "  started {}  finished {}  elapsed {:.2}s  ({} cpus, {} GiB)",
        info.start, info.end, info.elapsed, info.cpu_count, info.mem_gib
    );
}
