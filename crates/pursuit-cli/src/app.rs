//! Shared command plumbing: path resolution and store access.

use std::path::{Path, PathBuf};

use pursuit_core::{store, Store};

use crate::cli::Cli;
use crate::config::{
    default_backup_dir, default_config_path, default_store_path, read_config,
};

/// Resolve the store path: `--store`/env first, then config, then the
/// XDG default.
pub fn resolve_store_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.store {
        return Ok(PathBuf::from(path));
    }
    let config_path = default_config_path()?;
    if config_path.exists() {
        let config = read_config(&config_path)?;
        return Ok(PathBuf::from(config.store.path));
    }
    default_store_path()
}

/// Resolve the backup directory: config override first, then the XDG
/// default.
pub fn resolve_backup_dir() -> anyhow::Result<PathBuf> {
    let config_path = default_config_path()?;
    if config_path.exists() {
        let config = read_config(&config_path)?;
        if let Some(dir) = config.backup.dir {
            return Ok(PathBuf::from(dir));
        }
    }
    default_backup_dir()
}

/// Initialize (or fetch) the process-wide store for an existing file.
///
/// Commands other than `init` refuse to create a store implicitly.
pub fn open_store(cli: &Cli) -> anyhow::Result<&'static Store> {
    let store_path = resolve_store_path(cli)?;
    if !store_path.exists() {
        return Err(anyhow::anyhow!(missing_store_message(&store_path)));
    }
    let backup_dir = resolve_backup_dir()?;
    Ok(store::init(&store_path, &backup_dir)?)
}

pub fn missing_store_message(path: &Path) -> String {
    format!(
        "No store found at {}\nHint: run `pursuit init` to create one.",
        path.display()
    )
}
