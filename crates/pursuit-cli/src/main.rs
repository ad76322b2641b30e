//! Pursuit CLI - a personal job-search tracker over a local SQLite store.
//!
//! This binary is a thin host around `pursuit-core`: it resolves paths,
//! initializes the process-wide store, and exposes the backup operations
//! the desktop application drives from its settings screen.

mod app;
mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{BackupCommands, Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Init(args) => commands::init::handle_init(&cli, args),
        Commands::Backup(args) => match &args.command {
            BackupCommands::Now => commands::backup::handle_now(&cli),
            BackupCommands::Sweep => commands::backup::handle_sweep(&cli),
            BackupCommands::List(list_args) => commands::backup::handle_list(&cli, list_args),
            BackupCommands::Info => commands::backup::handle_info(&cli),
            BackupCommands::Restore(restore_args) => {
                commands::backup::handle_restore(&cli, restore_args)
            }
        },
        Commands::Status => commands::status::handle_status(&cli),
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
