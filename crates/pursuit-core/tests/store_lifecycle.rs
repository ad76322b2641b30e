use std::path::Path;

use rusqlite::Connection;
use tempfile::tempdir;

use pursuit_core::migrate::Migrator;
use pursuit_core::schema::REQUIRED_COLUMNS;
use pursuit_core::Store;

/// Build a store file the way the initial release would have: old column
/// names, none of the v2 columns.
fn write_legacy_store(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE contacts (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         VARCHAR(255) NOT NULL,
            job_title    VARCHAR(255) NOT NULL,
            company      VARCHAR(255) NOT NULL,
            contact_date DATE NOT NULL,
            status       VARCHAR(50) NOT NULL DEFAULT 'Cold message',
            created_at   DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_updated DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
         );
         CREATE TABLE applications (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name        VARCHAR(255) NOT NULL,
            company          VARCHAR(255) NOT NULL,
            application_date DATE NOT NULL,
            status           VARCHAR(50) NOT NULL DEFAULT 'Applied',
            last_updated     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
         );
         INSERT INTO contacts (name, job_title, company, contact_date, last_updated)
         VALUES ('Grace', 'Manager', 'Globex', '2026-05-01', '2026-05-02 09:00:00');",
    )
    .unwrap();
}

#[test]
fn test_fresh_init_creates_file_with_full_schema() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("t.db");

    let store = Store::initialize(&db_path, &dir.path().join("backups")).unwrap();

    assert!(db_path.exists());
    let conn = store.connection().unwrap();
    let migrator = Migrator::new(&conn);
    for col in REQUIRED_COLUMNS {
        assert!(
            migrator.column_exists(col.table, col.column).unwrap(),
            "fresh schema missing {}.{}",
            col.table,
            col.column
        );
    }
    assert!(migrator.column_exists("contacts", "updated_at").unwrap());
    // Nothing to back up on a fresh store.
    assert_eq!(store.backups().backup_info().total_backups, 0);
}

#[test]
fn test_pre_existing_store_is_migrated_and_swept() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("t.db");
    write_legacy_store(&db_path);

    let store = Store::initialize(&db_path, &dir.path().join("backups")).unwrap();

    let conn = store.connection().unwrap();
    let migrator = Migrator::new(&conn);
    assert!(migrator.column_exists("contacts", "email").unwrap());
    assert!(migrator.column_exists("applications", "deadline").unwrap());

    // transition copy preserved the old timestamp
    let updated_at: String = conn
        .query_row(
            "SELECT updated_at FROM contacts WHERE name = 'Grace'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(updated_at, "2026-05-02 09:00:00");

    // the startup sweep found every scheduled tier due
    let info = store.backups().backup_info();
    assert_eq!(info.daily_backups, 1);
    assert_eq!(info.weekly_backups, 1);
    assert_eq!(info.monthly_backups, 1);
}

#[test]
fn test_startup_continues_when_a_migration_step_fails() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("t.db");
    write_legacy_store(&db_path);
    {
        // applications as a view: every ALTER against it fails.
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "DROP TABLE applications;
             CREATE VIEW applications AS
             SELECT id, name AS role_name, company, contact_date AS application_date,
                    'Applied' AS status, last_updated
             FROM contacts;",
        )
        .unwrap();
    }

    // Initialization survives the failed step and hands back a live store.
    let store = Store::initialize(&db_path, &dir.path().join("backups")).unwrap();

    let conn = store.connection().unwrap();
    let migrator = Migrator::new(&conn);
    // Steps committed before the failure are kept; the failed one is not.
    assert!(migrator.column_exists("contacts", "email").unwrap());
    assert!(!migrator.column_exists("applications", "deadline").unwrap());

    // The handle is usable at the last committed schema and the startup
    // sweep still ran.
    let name: String = conn
        .query_row("SELECT name FROM contacts WHERE name = 'Grace'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(name, "Grace");
    assert_eq!(store.backups().backup_info().daily_backups, 1);
}

#[test]
fn test_pre_existing_store_does_not_reseed_settings() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("t.db");

    // settings row customized by the first run
    {
        let store = Store::initialize(&db_path, &dir.path().join("backups")).unwrap();
        let conn = store.connection().unwrap();
        conn.execute("UPDATE settings SET follow_up_days = 10", [])
            .unwrap();
    }

    let store = Store::initialize(&db_path, &dir.path().join("backups")).unwrap();
    let conn = store.connection().unwrap();
    let (count, follow_up_days): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), MAX(follow_up_days) FROM settings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(follow_up_days, 10);
}

#[test]
fn test_manual_backup_delegates_to_compressed_manual_tier() {
    let dir = tempdir().unwrap();
    let store =
        Store::initialize(&dir.path().join("t.db"), &dir.path().join("backups")).unwrap();

    let snapshot = store.create_manual_backup().unwrap();
    assert!(snapshot.to_string_lossy().ends_with(".db.gz"));

    let records = store.backups().list_backups(None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tier, pursuit_core::BackupTier::Manual);
}

#[test]
fn test_init_fails_when_parent_cannot_be_created() {
    let dir = tempdir().unwrap();
    // A file where a directory is needed.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();

    let result = Store::initialize(&blocker.join("t.db"), &dir.path().join("backups"));
    assert!(matches!(
        result,
        Err(pursuit_core::StoreError::Init(_))
    ));
}
