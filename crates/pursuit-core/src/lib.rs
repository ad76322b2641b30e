//! # Pursuit Core
//!
//! Core library for Pursuit - a personal job-search tracker over a local
//! SQLite store.
//!
//! This crate owns the store lifecycle: opening or creating the database
//! file, additive schema migration, and tiered snapshot backups with
//! scheduled rotation and safe restore. The UI and business CRUD layers
//! are consumers of the handle this crate produces; they are not part of
//! it.
//!
//! ## Architecture
//!
//! - **store**: process-wide store handle and initialization order
//! - **schema**: current DDL and the column requirement set
//! - **migrate**: idempotent, additive-only schema migration
//! - **backup**: snapshot creation, retention tiers, rotation, restore

pub mod backup;
pub mod error;
pub mod migrate;
pub mod schema;
pub mod store;

pub use backup::{BackupInfo, BackupManager, BackupRecord, BackupTier};
pub use error::{Result, StoreError};
pub use migrate::Migrator;
pub use store::Store;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
