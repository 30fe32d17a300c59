//! The store every other crate talks to.
//!
//! `AcademyStore` wraps `AcademyDb` and a gate that admits one unit of work
//! at a time. Writers take the gate for a whole import; readers take it for a
//! short read transaction. Repo methods are implemented on `UnitOfWork`.

use std::collections::BTreeMap;
use std::sync::Arc;

use acx_core::entities::{AcademyRecord, AcademySettings, ContentCounts, ExportDocument};
use acx_core::conflict::TargetContext;
use acx_core::enums::ContentLevel;
use acx_core::responses::ImportOptions;
use libsql::TransactionBehavior;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::AcademyDb;
use crate::error::DatabaseError;
use crate::unit_of_work::UnitOfWork;

pub struct AcademyStore {
    db: AcademyDb,
    gate: Arc<Mutex<()>>,
}

impl AcademyStore {
    /// Open (and migrate) a local store at `path`, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from_db(AcademyDb::open_local(path).await?))
    }

    #[must_use]
    pub fn from_db(db: AcademyDb) -> Self {
        Self {
            db,
            gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub const fn db(&self) -> &AcademyDb {
        &self.db
    }

    /// Start a write unit of work (`BEGIN IMMEDIATE`), waiting for the gate.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be opened.
    pub async fn begin(&self) -> Result<UnitOfWork, DatabaseError> {
        let gate = Arc::clone(&self.gate).lock_owned().await;
        debug!("unit of work started");
        UnitOfWork::begin(self.db.conn(), gate, TransactionBehavior::Immediate).await
    }

    async fn begin_read(&self) -> Result<UnitOfWork, DatabaseError> {
        let gate = Arc::clone(&self.gate).lock_owned().await;
        UnitOfWork::begin(self.db.conn(), gate, TransactionBehavior::Deferred).await
    }

    pub async fn get_academy(&self, id: &str) -> Result<Option<AcademyRecord>, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.get_academy(id).await;
        uow.finish(result).await
    }

    pub async fn find_academy_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<AcademyRecord>, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.find_academy_by_slug(slug).await;
        uow.finish(result).await
    }

    pub async fn list_academies(&self) -> Result<Vec<AcademyRecord>, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.list_academies().await;
        uow.finish(result).await
    }

    pub async fn get_settings(
        &self,
        academy_id: &str,
    ) -> Result<Option<AcademySettings>, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.get_settings(academy_id).await;
        uow.finish(result).await.map(|r| r.map(|s| s.settings))
    }

    /// Number of content rows per level stored under `academy_id`.
    pub async fn academy_counts(&self, academy_id: &str) -> Result<ContentCounts, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.academy_counts(academy_id).await;
        uow.finish(result).await
    }

    /// Row count of every table, keyed by table name.
    pub async fn row_counts(&self) -> Result<BTreeMap<&'static str, i64>, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.row_counts().await;
        uow.finish(result).await
    }

    /// Snapshot of everything conflict detection needs for `doc`.
    pub async fn target_context(
        &self,
        doc: &ExportDocument,
        options: &ImportOptions,
    ) -> Result<TargetContext, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.target_context(doc, options).await;
        uow.finish(result).await
    }

    /// Rebuild an export document from the stored academy `academy_id`.
    pub async fn export_academy(
        &self,
        academy_id: &str,
        exported_by: Option<Value>,
    ) -> Result<ExportDocument, DatabaseError> {
        let uow = self.begin_read().await?;
        let result = uow.export_academy(academy_id, exported_by).await;
        uow.finish(result).await
    }
}

impl UnitOfWork {
    /// Row count of every table, keyed by table name.
    pub async fn row_counts(&self) -> Result<BTreeMap<&'static str, i64>, DatabaseError> {
        let mut counts = BTreeMap::new();
        let tables = ["academies", "academy_settings"]
            .into_iter()
            .chain(ContentLevel::ALL.iter().map(|l| l.table()));
        for table in tables {
            let mut rows = self
                .conn()
                .query(&format!("SELECT COUNT(*) FROM {table}"), ())
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            counts.insert(table, row.get::<i64>(0)?);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acx_core::entities::Academy;
    use std::time::Duration;

    async fn store() -> Arc<AcademyStore> {
        Arc::new(AcademyStore::open_local(":memory:").await.unwrap())
    }

    fn academy(slug: &str) -> Academy {
        Academy {
            name: Some("Academy".into()),
            slug: Some(slug.into()),
            ..Academy::default()
        }
    }

    #[tokio::test]
    async fn dropped_unit_rolls_back() {
        let store = store().await;
        {
            let uow = store.begin().await.unwrap();
            uow.insert_academy(&academy("gone"), "gone").await.unwrap();
        }
        assert!(store.find_academy_by_slug("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finish_commits_ok_and_rolls_back_err() {
        let store = store().await;

        let uow = store.begin().await.unwrap();
        let inserted = uow.insert_academy(&academy("kept"), "kept").await;
        uow.finish(inserted).await.unwrap();

        let uow = store.begin().await.unwrap();
        let failed: Result<(), DatabaseError> = async {
            uow.insert_academy(&academy("lost"), "lost").await?;
            Err(DatabaseError::InvalidState("boom".into()))
        }
        .await;
        assert!(uow.finish(failed).await.is_err());

        assert!(store.find_academy_by_slug("kept").await.unwrap().is_some());
        assert!(store.find_academy_by_slug("lost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn readers_wait_for_the_writer() {
        let store = store().await;
        let uow = store.begin().await.unwrap();
        uow.insert_academy(&academy("pending"), "pending").await.unwrap();

        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.find_academy_by_slug("pending").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!reader.is_finished(), "reader must block while a unit is open");

        uow.commit().await.unwrap();
        let seen = reader.await.unwrap().unwrap();
        assert!(seen.is_some(), "reader sees the committed row");
    }
}
