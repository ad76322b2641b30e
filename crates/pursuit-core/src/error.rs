//! Error types for store lifecycle operations.
//!
//! The rough taxonomy: initialization and migration errors are fatal to
//! their operation and carry enough context (path, table, column) to
//! diagnose from a log line; backup errors are non-fatal and the caller
//! decides whether to retry. Reporting helpers never return errors at all,
//! they degrade to empty results.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for store lifecycle, migration, and backup operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be created or opened. Fatal: there is no store
    /// without it.
    #[error("Store initialization failed: {0}")]
    Init(String),

    /// A store operation was invoked before `store::init`.
    #[error("Store is not initialized; call store::init first")]
    NotInitialized,

    /// `store::init` was invoked a second time with a different path.
    #[error("Store already initialized at {existing}, refusing to re-initialize at {requested}")]
    AlreadyInitialized {
        existing: PathBuf,
        requested: PathBuf,
    },

    /// Schema introspection failed against an unreachable store.
    #[error("Schema introspection failed: {0}")]
    Introspection(#[source] rusqlite::Error),

    /// An additive migration step failed. Aborts the migration run; steps
    /// already committed stay committed.
    #[error("Migration step failed for {table}.{column}: {source}")]
    MigrationStep {
        table: &'static str,
        column: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// I/O failure while creating, rotating, or restoring a snapshot.
    #[error("Backup I/O error on {path}: {source}")]
    BackupIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The live store file does not exist, so there is nothing to back up.
    #[error("Store file not found: {0}")]
    SourceMissing(PathBuf),

    /// A mutex guarding the store or backup manager was poisoned.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// General database error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
