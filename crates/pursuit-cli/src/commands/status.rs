use pursuit_core::Migrator;

use crate::app::open_store;
use crate::cli::Cli;

pub fn handle_status(cli: &Cli) -> anyhow::Result<()> {
    let store = open_store(cli)?;

    let schema_current = {
        let conn = store.connection()?;
        !Migrator::new(&conn).needs_migration()?
    };

    if cli.quiet {
        return Ok(());
    }

    println!("Store: {}", store.path().display());
    println!(
        "Schema: {}",
        if schema_current { "current" } else { "outdated" }
    );

    let info = store.backups().backup_info();
    println!("Backup root: {}", store.backups().root().display());
    println!(
        "Backups: {} recorded, last at {}",
        info.total_backups,
        info.last_backup
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    Ok(())
}
