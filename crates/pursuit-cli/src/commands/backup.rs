use std::io::IsTerminal;
use std::path::Path;

use pursuit_core::{BackupRecord, BackupTier};

use crate::app::open_store;
use crate::cli::{Cli, ListArgs, RestoreArgs};

pub fn handle_now(cli: &Cli) -> anyhow::Result<()> {
    let store = open_store(cli)?;
    let snapshot = store.create_manual_backup()?;
    if !cli.quiet {
        println!("Backup created: {}", snapshot.display());
    }
    Ok(())
}

pub fn handle_sweep(cli: &Cli) -> anyhow::Result<()> {
    let store = open_store(cli)?;
    // open_store already ran the startup sweep for a pre-existing file;
    // run it again explicitly so `sweep` works on a long-lived process's
    // schedule too.
    store.backups().perform_scheduled_backups();
    if !cli.quiet {
        let info = store.backups().backup_info();
        println!(
            "Sweep complete: {} daily, {} weekly, {} monthly backups on record",
            info.daily_backups, info.weekly_backups, info.monthly_backups
        );
    }
    Ok(())
}

pub fn handle_list(cli: &Cli, args: &ListArgs) -> anyhow::Result<()> {
    let store = open_store(cli)?;
    let tier = args
        .tier
        .as_deref()
        .map(str::parse::<BackupTier>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let records = store.backups().list_backups(tier);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        if !cli.quiet {
            println!("No backups recorded");
        }
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &BackupRecord) {
    println!(
        "{}  {:<8} {:>10}  {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.tier,
        format_size(record.size_bytes),
        record.path.display()
    );
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

pub fn handle_info(cli: &Cli) -> anyhow::Result<()> {
    let store = open_store(cli)?;
    let info = store.backups().backup_info();

    println!("Backups recorded: {}", info.total_backups);
    println!(
        "Last backup: {}",
        info.last_backup
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    println!("Total size: {}", format_size(info.total_size_bytes));
    println!(
        "By tier: {} daily, {} weekly, {} monthly",
        info.daily_backups, info.weekly_backups, info.monthly_backups
    );
    Ok(())
}

pub fn handle_restore(cli: &Cli, args: &RestoreArgs) -> anyhow::Result<()> {
    let snapshot = Path::new(&args.snapshot);
    let store = open_store(cli)?;

    if std::io::stdin().is_terminal() && !args.no_input && !cli.quiet {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Overwrite {} with {}?",
                store.path().display(),
                snapshot.display()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(anyhow::anyhow!("Restore cancelled"));
        }
    }

    if !store.backups().restore(snapshot)? {
        return Err(anyhow::anyhow!(
            "Snapshot not found: {}",
            snapshot.display()
        ));
    }

    if !cli.quiet {
        println!("Store restored from {}", snapshot.display());
        println!("A pre-restore safety copy was left in {}", store.backups().root().display());
        println!("Restart the application to pick up the restored data.");
    }
    Ok(())
}
