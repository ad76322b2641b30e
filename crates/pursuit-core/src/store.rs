//! Store handle: owns the on-disk database file and its backup manager.
//!
//! `Store::initialize` is the single entry point that produces a
//! ready-to-use store: it creates the file if absent, ensures the schema,
//! migrates a pre-existing file, and runs the scheduled backup sweep. The
//! module-level [`init`]/[`get`] pair gives the host application its
//! "initialize once, reuse everywhere" handle without hidden mutable
//! globals beyond the cell itself.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use rusqlite::Connection;
use tracing::{error, info};

use crate::backup::{BackupManager, BackupTier};
use crate::error::{Result, StoreError};
use crate::migrate::Migrator;
use crate::schema;

/// Default message template seeded into a fresh store's settings row.
const DEFAULT_MESSAGE_TEMPLATE: &str = "\
Hi {name},

My name is {user_name}, and I'm currently a student at {user_school}. I came \
across your profile and was really impressed by your work as a {job_title} \
at {company}.

{user_ambitions}

{relevant_info}

I would love to learn more about your experience and any advice you might \
have. Would you be open to a brief chat sometime?

Best regards,
{user_name}";

/// An initialized store: database connection plus backup manager.
pub struct Store {
    path: PathBuf,
    conn: Mutex<Connection>,
    backups: BackupManager,
}

impl Store {
    /// Open or create the store file at `path`, with backups kept under
    /// `backup_dir`.
    ///
    /// If the file pre-existed, the schema migrator runs before the
    /// backup manager is constructed, and any due scheduled backups are
    /// taken (plus rotation). A fresh file is definitionally at the
    /// latest schema and has nothing to protect yet, so it skips both and
    /// gets the default settings row instead.
    ///
    /// A failed migration step is logged, not fatal: every step that did
    /// commit stays committed, the store remains usable at that schema
    /// state, and the next startup retries the remaining steps. Only a
    /// store that cannot be opened at all is an error.
    pub fn initialize(path: &Path, backup_dir: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Init(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let pre_existed = path.exists();
        info!(path = %path.display(), pre_existed, "opening store");

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Init(format!("cannot open {}: {}", path.display(), e)))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(schema::SCHEMA)?;

        if pre_existed {
            if let Err(err) = Migrator::new(&conn).run_if_needed() {
                error!(error = %err, "schema migration failed, continuing at last committed schema");
            }
        } else {
            seed_default_settings(&conn)?;
        }

        let backups = BackupManager::new(path, backup_dir)?;
        if pre_existed {
            backups.perform_scheduled_backups();
        }

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            backups,
        })
    }

    /// Path of the live store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow the database connection.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// The backup manager owned by this store.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Create a compressed manual snapshot.
    pub fn create_manual_backup(&self) -> Result<PathBuf> {
        self.backups.create_backup(BackupTier::Manual, true)
    }
}

fn seed_default_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (id, message_template, follow_up_days, user_name, user_school, user_ambitions)
         VALUES (1, ?1, 3, 'Your Name', 'Your University', ?2)",
        rusqlite::params![
            DEFAULT_MESSAGE_TEMPLATE,
            "I'm passionate about breaking into the industry and gaining hands-on experience.",
        ],
    )?;
    info!("default settings seeded");
    Ok(())
}

static STORE: OnceCell<Store> = OnceCell::new();

/// Initialize the process-wide store.
///
/// Idempotent for the same `path`: later calls return the existing handle
/// and ignore `backup_dir`. Calling again with a *different* path fails
/// with [`StoreError::AlreadyInitialized`].
pub fn init(path: &Path, backup_dir: &Path) -> Result<&'static Store> {
    let store = STORE.get_or_try_init(|| Store::initialize(path, backup_dir))?;
    if store.path() != path {
        return Err(StoreError::AlreadyInitialized {
            existing: store.path().to_path_buf(),
            requested: path.to_path_buf(),
        });
    }
    Ok(store)
}

/// The process-wide store, if [`init`] has run.
pub fn get() -> Result<&'static Store> {
    STORE.get().ok_or(StoreError::NotInitialized)
}
