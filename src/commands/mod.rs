//! CLI command implementations.

pub mod clean;
pub mod info;
pub mod ls;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::locator::OutputLocator;
use crate::models::TaskIdentity;
use crate::store::{FsObjectStore, ObjectStore};
use crate::tracker::Tracker;

/// Store and tracker wired up from a config value.
pub(crate) struct Env {
    pub store: Arc<dyn ObjectStore>,
    pub tracker: Tracker,
    pub prefix: Option<String>,
}

pub(crate) fn build_env(config: &Config) -> Result<Env> {
    let store: Arc<dyn ObjectStore> = Arc::new(
        FsObjectStore::new(&config.store.root).with_context(|| {
            format!(
                "Failed to open object store at {}",
                config.store.root.display()
            )
        })?,
    );
    let locator = OutputLocator::new(config.store.prefix.clone());
    let tracker = Tracker::new(Arc::clone(&store), locator);
    Ok(Env {
        store,
        tracker,
        prefix: config.store.prefix.clone().filter(|p| !p.is_empty()),
    })
}

/// Builds a task identity from a step name and repeated `key=value` args.
pub(crate) fn parse_task(name: &str, params: &[String]) -> Result<TaskIdentity> {
    let mut task = TaskIdentity::new(name)?;
    for pair in params {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid parameter '{pair}': expected KEY=VALUE"))?;
        task = task.with_param(key, value)?;
    }
    Ok(task)
}
