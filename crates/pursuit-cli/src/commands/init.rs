use std::path::PathBuf;

use pursuit_core::store;

use crate::cli::{Cli, InitArgs};
use crate::config::{
    default_backup_dir, default_config_path, default_store_path, write_config, TrackerConfig,
};

pub fn handle_init(cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let store_path = match args.path.as_ref().or(cli.store.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => default_store_path()?,
    };
    let backup_dir = match &args.backup_dir {
        Some(dir) => PathBuf::from(dir),
        None => default_backup_dir()?,
    };

    let store = store::init(&store_path, &backup_dir)?;

    let config_path = default_config_path()?;
    let config = TrackerConfig::new(
        store_path.clone(),
        args.backup_dir.as_ref().map(PathBuf::from),
    );
    write_config(&config_path, &config)?;

    if !cli.quiet {
        println!("Store ready at {}", store.path().display());
        println!("Backups under {}", store.backups().root().display());
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}
