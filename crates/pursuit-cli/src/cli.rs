use clap::{Args, Parser, Subcommand};

use pursuit_core::VERSION;

/// Pursuit - a personal job-search tracker over a local SQLite store
#[derive(Parser)]
#[command(name = "pursuit")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store file (overrides config)
    #[arg(short, long, global = true, env = "PURSUIT_STORE")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the store and write the default config
    Init(InitArgs),

    /// Create, inspect, and restore backups
    Backup(BackupArgs),

    /// Report store health and backup statistics
    Status,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Directory for backups (default: alongside the store)
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<String>,
}

/// Arguments for the `backup` command group
#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommands,
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a manual compressed snapshot now
    Now,

    /// Create any due scheduled backups and rotate each tier
    Sweep,

    /// List recorded snapshots, newest first
    List(ListArgs),

    /// Show aggregate backup statistics
    Info,

    /// Restore the store from a snapshot
    Restore(RestoreArgs),
}

/// Arguments for `backup list`
#[derive(Args)]
pub struct ListArgs {
    /// Filter by tier (manual, daily, weekly, monthly)
    #[arg(long, value_name = "TIER")]
    pub tier: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `backup restore`
#[derive(Args)]
pub struct RestoreArgs {
    /// Path to the snapshot file
    #[arg(value_name = "PATH")]
    pub snapshot: String,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}
