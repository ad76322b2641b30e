//! Additive schema migration for pre-existing store files.
//!
//! There is no migration-version table: "does the column exist" is the only
//! state, which makes every step idempotent and the whole run safe to
//! repeat on each startup. The cost is that destructive changes cannot be
//! expressed; renames are handled by adding the new column and copying
//! values, keeping the old column readable.
//!
//! Each step commits independently. A hard failure aborts the run and is
//! reported with the table and column that failed; steps already applied
//! stay applied.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::schema::{RenameTransition, RequiredColumn, REQUIRED_COLUMNS, RENAME_TRANSITIONS};

/// Brings an existing store file's schema up to the current requirement set.
pub struct Migrator<'a> {
    conn: &'a Connection,
}

impl<'a> Migrator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Check whether `table` has a column named `column`.
    ///
    /// A missing table reports the column as absent rather than erroring;
    /// `pragma_table_info` simply yields no rows for it.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")
            .map_err(StoreError::Introspection)?;
        stmt.exists(rusqlite::params![table, column])
            .map_err(StoreError::Introspection)
    }

    /// Add a column if it is not already present. Each call is its own
    /// atomic unit; a failure aborts the calling run.
    pub fn add_column_if_missing(&self, col: &RequiredColumn) -> Result<()> {
        if self.column_exists(col.table, col.column)? {
            debug!(table = col.table, column = col.column, "column already exists");
            return Ok(());
        }

        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            col.table, col.column, col.sql_type
        );
        if let Some(default) = col.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }

        self.conn
            .execute(&sql, [])
            .map_err(|source| StoreError::MigrationStep {
                table: col.table,
                column: col.column,
                source,
            })?;
        info!(table = col.table, column = col.column, "added column");
        Ok(())
    }

    /// Apply a rename transition: add the new column and copy the old
    /// column's values into it, or just ensure the new column exists when
    /// the old one was never there.
    fn apply_rename(&self, transition: &RenameTransition) -> Result<()> {
        let step_error = |source| StoreError::MigrationStep {
            table: transition.table,
            column: transition.new,
            source,
        };

        if !self.column_exists(transition.table, transition.old)? {
            return self.add_column_if_missing(&RequiredColumn {
                table: transition.table,
                column: transition.new,
                sql_type: transition.sql_type,
                default: None,
            });
        }

        if self.column_exists(transition.table, transition.new)? {
            return Ok(());
        }

        self.conn
            .execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    transition.table, transition.new, transition.sql_type
                ),
                [],
            )
            .map_err(step_error)?;
        self.conn
            .execute(
                &format!(
                    "UPDATE {} SET {} = {}",
                    transition.table, transition.new, transition.old
                ),
                [],
            )
            .map_err(step_error)?;
        info!(
            table = transition.table,
            old = transition.old,
            new = transition.new,
            "copied renamed column"
        );
        Ok(())
    }

    /// True if any column the current model requires is absent.
    pub fn needs_migration(&self) -> Result<bool> {
        for col in REQUIRED_COLUMNS {
            if !self.column_exists(col.table, col.column)? {
                return Ok(true);
            }
        }
        for transition in RENAME_TRANSITIONS {
            if !self.column_exists(transition.table, transition.new)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run the full migration step sequence if anything is missing.
    ///
    /// Safe to call on every startup. Returns whether a migration ran.
    pub fn run_if_needed(&self) -> Result<bool> {
        if !self.needs_migration()? {
            debug!("schema is up to date");
            return Ok(false);
        }

        info!("schema outdated, migrating");
        for col in REQUIRED_COLUMNS {
            self.add_column_if_missing(col)?;
        }
        for transition in RENAME_TRANSITIONS {
            self.apply_rename(transition)?;
        }
        info!("migration completed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Schema as the initial release created it: no v2 columns, and the
    /// timestamp column still under its old name.
    const LEGACY_SCHEMA: &str = "
        CREATE TABLE contacts (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          VARCHAR(255) NOT NULL,
            job_title     VARCHAR(255) NOT NULL,
            company       VARCHAR(255) NOT NULL,
            contact_date  DATE NOT NULL,
            relevant_info TEXT,
            status        VARCHAR(50) NOT NULL DEFAULT 'Cold message',
            created_at    DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_updated  DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE applications (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name        VARCHAR(255) NOT NULL,
            company          VARCHAR(255) NOT NULL,
            job_link         TEXT,
            contact_id       INTEGER REFERENCES contacts(id),
            application_date DATE NOT NULL,
            status           VARCHAR(50) NOT NULL DEFAULT 'Applied',
            notes            TEXT,
            last_updated     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    ";

    fn legacy_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_column_exists_missing_table_is_false() {
        let conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&conn);
        assert!(!migrator.column_exists("no_such_table", "email").unwrap());
    }

    #[test]
    fn test_add_column_is_idempotent() {
        let conn = legacy_conn();
        let migrator = Migrator::new(&conn);
        let col = RequiredColumn {
            table: "contacts",
            column: "email",
            sql_type: "VARCHAR(255)",
            default: None,
        };

        migrator.add_column_if_missing(&col).unwrap();
        assert!(migrator.column_exists("contacts", "email").unwrap());
        // Second application is a no-op, not an error.
        migrator.add_column_if_missing(&col).unwrap();
    }

    #[test]
    fn test_added_column_is_null_for_existing_rows() {
        let conn = legacy_conn();
        conn.execute(
            "INSERT INTO contacts (name, job_title, company, contact_date)
             VALUES ('Ada', 'Engineer', 'Initech', '2026-01-15')",
            [],
        )
        .unwrap();

        Migrator::new(&conn).run_if_needed().unwrap();

        let email: Option<String> = conn
            .query_row("SELECT email FROM contacts WHERE name = 'Ada'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(email, None);
    }

    #[test]
    fn test_rename_transition_copies_values() {
        let conn = legacy_conn();
        conn.execute(
            "INSERT INTO contacts (name, job_title, company, contact_date, last_updated)
             VALUES ('Ada', 'Engineer', 'Initech', '2026-01-15', '2026-02-01 10:00:00')",
            [],
        )
        .unwrap();

        Migrator::new(&conn).run_if_needed().unwrap();

        let (old_value, new_value): (String, String) = conn
            .query_row(
                "SELECT last_updated, updated_at FROM contacts WHERE name = 'Ada'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        // Copy, not move: the old column keeps its data.
        assert_eq!(new_value, "2026-02-01 10:00:00");
        assert_eq!(old_value, new_value);
    }

    #[test]
    fn test_rename_transition_without_old_column_adds_new() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE contacts (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE applications (id INTEGER PRIMARY KEY, role_name TEXT NOT NULL);",
        )
        .unwrap();

        let migrator = Migrator::new(&conn);
        migrator.run_if_needed().unwrap();

        assert!(migrator.column_exists("contacts", "updated_at").unwrap());
        assert!(!migrator.column_exists("contacts", "last_updated").unwrap());
    }

    #[test]
    fn test_run_if_needed_is_reentrant() {
        let conn = legacy_conn();
        let migrator = Migrator::new(&conn);

        assert!(migrator.run_if_needed().unwrap());
        for col in REQUIRED_COLUMNS {
            assert!(migrator.column_exists(col.table, col.column).unwrap());
        }
        // Nothing left to do on the second pass.
        assert!(!migrator.run_if_needed().unwrap());
    }

    #[test]
    fn test_failed_step_keeps_earlier_steps_committed() {
        let conn = legacy_conn();
        // Rebuild applications as a view so every ALTER against it fails.
        conn.execute_batch(
            "DROP TABLE applications;
             CREATE VIEW applications AS
             SELECT id, name AS role_name, company, contact_date AS application_date,
                    'Applied' AS status, last_updated
             FROM contacts;",
        )
        .unwrap();

        let migrator = Migrator::new(&conn);
        let err = migrator
            .run_if_needed()
            .expect_err("a view cannot take new columns");
        match err {
            StoreError::MigrationStep { table, column, .. } => {
                assert_eq!(table, "applications");
                assert_eq!(column, "deadline");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Steps that committed before the failure stay committed.
        assert!(migrator.column_exists("contacts", "email").unwrap());
        assert!(migrator.column_exists("contacts", "deleted_at").unwrap());
        assert!(!migrator.column_exists("applications", "deadline").unwrap());
    }

    #[test]
    fn test_existing_data_survives_migration() {
        let conn = legacy_conn();
        conn.execute(
            "INSERT INTO applications (role_name, company, application_date, notes)
             VALUES ('SWE Intern', 'Initech', '2026-03-01', 'referred by Ada')",
            [],
        )
        .unwrap();

        Migrator::new(&conn).run_if_needed().unwrap();

        let (role, notes): (String, String) = conn
            .query_row(
                "SELECT role_name, notes FROM applications",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(role, "SWE Intern");
        assert_eq!(notes, "referred by Ada");
    }
}
