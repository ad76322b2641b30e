//! Current schema DDL and the column requirement set the migrator works from.
//!
//! The DDL describes the tables a fresh store gets. Stores created by older
//! versions of the application may lack some of the columns below; the
//! requirement set and rename transitions describe exactly what the
//! migrator must ensure exists. Neither is persisted anywhere, they are
//! compile-time input to [`crate::migrate::Migrator`].

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Executed unconditionally on every startup. Existing tables are left
/// untouched, so bringing an old table up to date is the migrator's job.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          VARCHAR(255) NOT NULL,
    job_title     VARCHAR(255) NOT NULL,
    company       VARCHAR(255) NOT NULL,
    contact_date  DATE NOT NULL,
    relevant_info TEXT,
    status        VARCHAR(50) NOT NULL DEFAULT 'Cold message',
    email         VARCHAR(255),
    linkedin_url  VARCHAR(500),
    phone         VARCHAR(20),
    is_deleted    BOOLEAN NOT NULL DEFAULT 0,
    deleted_at    DATETIME,
    created_at    DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS applications (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    role_name        VARCHAR(255) NOT NULL,
    company          VARCHAR(255) NOT NULL,
    job_link         TEXT,
    contact_id       INTEGER REFERENCES contacts(id),
    application_date DATE NOT NULL,
    status           VARCHAR(50) NOT NULL DEFAULT 'Applied',
    notes            TEXT,
    deadline         DATE,
    salary_min       INTEGER,
    salary_max       INTEGER,
    location         VARCHAR(200),
    is_remote        BOOLEAN NOT NULL DEFAULT 0,
    is_deleted       BOOLEAN NOT NULL DEFAULT 0,
    deleted_at       DATETIME,
    created_at       DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at       DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS settings (
    id               INTEGER PRIMARY KEY,
    message_template TEXT NOT NULL,
    follow_up_days   INTEGER NOT NULL DEFAULT 3,
    user_name        VARCHAR(255),
    user_school      VARCHAR(255),
    user_ambitions   TEXT
);
";

/// A column the current data model requires to exist.
#[derive(Debug, Clone, Copy)]
pub struct RequiredColumn {
    pub table: &'static str,
    pub column: &'static str,
    pub sql_type: &'static str,
    /// Literal default expression, if any. Must be a constant: SQLite
    /// rejects non-constant defaults in `ALTER TABLE ... ADD COLUMN`, so
    /// timestamp columns added by migration get NULL for existing rows.
    pub default: Option<&'static str>,
}

/// Columns added since the initial release, in application order.
pub const REQUIRED_COLUMNS: &[RequiredColumn] = &[
    RequiredColumn {
        table: "contacts",
        column: "email",
        sql_type: "VARCHAR(255)",
        default: None,
    },
    RequiredColumn {
        table: "contacts",
        column: "linkedin_url",
        sql_type: "VARCHAR(500)",
        default: None,
    },
    RequiredColumn {
        table: "contacts",
        column: "phone",
        sql_type: "VARCHAR(20)",
        default: None,
    },
    RequiredColumn {
        table: "contacts",
        column: "is_deleted",
        sql_type: "BOOLEAN",
        default: Some("0"),
    },
    RequiredColumn {
        table: "contacts",
        column: "deleted_at",
        sql_type: "DATETIME",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "deadline",
        sql_type: "DATE",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "salary_min",
        sql_type: "INTEGER",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "salary_max",
        sql_type: "INTEGER",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "location",
        sql_type: "VARCHAR(200)",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "is_remote",
        sql_type: "BOOLEAN",
        default: Some("0"),
    },
    RequiredColumn {
        table: "applications",
        column: "is_deleted",
        sql_type: "BOOLEAN",
        default: Some("0"),
    },
    RequiredColumn {
        table: "applications",
        column: "deleted_at",
        sql_type: "DATETIME",
        default: None,
    },
    RequiredColumn {
        table: "applications",
        column: "created_at",
        sql_type: "DATETIME",
        default: None,
    },
];

/// A column rename handled by copy-then-keep-old.
///
/// The old column is never dropped: readers built against the previous
/// schema keep working, and additive-only migration cannot express a drop
/// anyway.
#[derive(Debug, Clone, Copy)]
pub struct RenameTransition {
    pub table: &'static str,
    pub old: &'static str,
    pub new: &'static str,
    pub sql_type: &'static str,
}

/// Rename transitions the model has accumulated.
pub const RENAME_TRANSITIONS: &[RenameTransition] = &[
    RenameTransition {
        table: "contacts",
        old: "last_updated",
        new: "updated_at",
        sql_type: "DATETIME",
    },
    RenameTransition {
        table: "applications",
        old: "last_updated",
        new: "updated_at",
        sql_type: "DATETIME",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_set_targets_known_tables() {
        for col in REQUIRED_COLUMNS {
            assert!(
                col.table == "contacts" || col.table == "applications",
                "unexpected table {}",
                col.table
            );
        }
    }

    #[test]
    fn test_requirement_defaults_are_constant() {
        // ALTER TABLE ADD COLUMN cannot carry CURRENT_TIMESTAMP et al.
        for col in REQUIRED_COLUMNS {
            if let Some(default) = col.default {
                assert!(!default.contains("CURRENT_"), "{}.{}", col.table, col.column);
            }
        }
    }

    #[test]
    fn test_schema_contains_every_required_column() {
        for col in REQUIRED_COLUMNS {
            assert!(SCHEMA.contains(col.column), "{} missing from DDL", col.column);
        }
        for transition in RENAME_TRANSITIONS {
            assert!(SCHEMA.contains(transition.new));
        }
    }
}
