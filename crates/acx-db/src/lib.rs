//! # acx-db
//!
//! libSQL persistence for academies, their settings, and their
//! course → module → lesson → quiz trees.
//!
//! All access goes through [`service::AcademyStore`], which serialises units
//! of work on its single connection so a reader never observes a half-applied
//! import. Repository methods live on [`unit_of_work::UnitOfWork`] and always
//! run inside a transaction.

pub mod context;
pub mod error;
pub mod export;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod unit_of_work;

use error::DatabaseError;
use libsql::Builder;

/// Database handle: the libSQL database plus its one connection.
pub struct AcademyDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl AcademyDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let academy_db = Self { db, conn };
        academy_db.run_migrations().await?;
        Ok(academy_db)
    }

    /// The underlying connection, for schema inspection and test fixtures.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
