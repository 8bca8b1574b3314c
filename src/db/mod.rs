//! SQLite-backed lead store.
//!
//! The database lives at `~/.leadbook/leadbook.db`. One struct owns the
//! connection; CRUD, search, audit and reporting queries hang off it in
//! per-concern files. Writes that touch a lead's searchable fields rewrite
//! the `lead_prefixes` child table inside the same transaction as the lead
//! row, so the denormalized search index can never drift from the fields it
//! was derived from.

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

mod audit;
mod leads;
mod reports;
mod search;
pub mod types;

pub use types::*;

pub struct LeadDb {
    conn: Connection,
}

impl LeadDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at the default path and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        Self::open_at(Self::db_path()?)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open a database at an explicit path in read-only mode. Safe for
    /// concurrent reads (reporting) while another process owns writes.
    pub fn open_readonly_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.leadbook/leadbook.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".leadbook").join("leadbook.db"))
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::test_db;
    use super::*;

    #[test]
    fn test_open_creates_tables() {
        let db = test_db();
        for table in ["leads", "lead_prefixes", "lead_audit", "status_transitions"] {
            let count: i32 = db
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap_or_else(|e| panic!("{} table should exist: {}", table, e));
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("reopen.db");
        let _db1 = LeadDb::open_at(path.clone()).expect("first open");
        let _db2 = LeadDb::open_at(path).expect("second open should not fail");
    }

    #[test]
    fn test_readonly_open_rejects_writes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ro.db");
        {
            let db = LeadDb::open_at(path.clone()).expect("open rw");
            db.conn_ref()
                .execute(
                    "INSERT INTO leads (id, first_name, last_name, status, source, created_at, updated_at)
                     VALUES ('l1', 'A', 'B', 'new', 'other', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
                    [],
                )
                .expect("insert");
        }

        let ro = LeadDb::open_readonly_at(&path).expect("open ro");
        let count: i32 = ro
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .expect("read");
        assert_eq!(count, 1);

        let write = ro.conn_ref().execute("DELETE FROM leads", []);
        assert!(write.is_err(), "read-only connection must reject writes");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = test_db();

        let result: Result<(), DbError> = db.with_transaction(|db| {
            db.conn_ref().execute(
                "INSERT INTO lead_audit (lead_id, action, created_at)
                 VALUES ('l1', 'created', '2024-01-01T00:00:00+00:00')",
                [],
            )?;
            Err(DbError::Migration("forced failure".to_string()))
        });
        assert!(result.is_err());

        let count: i32 = db
            .conn
            .query_row("SELECT COUNT(*) FROM lead_audit", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0, "rollback should discard the audit row");
    }
}
