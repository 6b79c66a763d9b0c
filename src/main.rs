use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sluice::commands::{clean, info, ls, status};
use sluice::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Completion tracking for pipeline step outputs", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (default: ./sluice.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage root directory (bypasses the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show completion state for one task, or list every tracked task
    Status {
        /// Step name
        task: Option<String>,

        /// Output-affecting parameter, repeatable (KEY=VALUE)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Print the run metadata recorded in a task's success marker
    Info {
        /// Step name
        task: String,

        /// Output-affecting parameter, repeatable (KEY=VALUE)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// List stored objects under a task's output
    Ls {
        /// Step name
        task: String,

        /// Output-affecting parameter, repeatable (KEY=VALUE)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Delete a task's output, success marker included
    Clean {
        /// Step name
        task: String,

        /// Output-affecting parameter, repeatable (KEY=VALUE)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.root, cli.config)?;

    match cli.command {
        Commands::Status { task, params } => status::execute(&config, task.as_deref(), &params),
        Commands::Info { task, params } => info::execute(&config, &task, &params),
        Commands::Ls { task, params } => ls::execute(&config, &task, &params),
        Commands::Clean { task, params } => clean::execute(&config, &task, &params),
    }
}

/// `--root` wins; otherwise the config file (explicit or the default name
/// in the working directory) decides where outputs live.
fn resolve_config(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(root) = root {
        return Ok(Config::from_root(root));
    }
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    load_config(&path).with_context(|| {
        format!(
            "No storage configured. Pass --root DIR or provide {}",
            path.display()
        )
    })
}
