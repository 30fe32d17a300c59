//! Explicit transactions.
//!
//! A [`UnitOfWork`] owns one libSQL transaction and the store's gate for as
//! long as it lives. Dropping it without [`UnitOfWork::commit`] rolls the
//! transaction back, so a cancelled or panicking caller never leaves partial
//! writes behind.

use libsql::{Connection, Transaction, TransactionBehavior};
use tokio::sync::OwnedMutexGuard;
use tracing::warn;

use crate::error::DatabaseError;

pub struct UnitOfWork {
    tx: Transaction,
    _gate: OwnedMutexGuard<()>,
}

impl UnitOfWork {
    pub(crate) async fn begin(
        conn: &Connection,
        gate: OwnedMutexGuard<()>,
        behavior: TransactionBehavior,
    ) -> Result<Self, DatabaseError> {
        let tx = conn.transaction_with_behavior(behavior).await?;
        Ok(Self { tx, _gate: gate })
    }

    /// The transaction's connection. Statements run here are part of the unit.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"crs-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Make every write of this unit durable and release the gate.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit fails; the transaction is then rolled back.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard every write of this unit and release the gate.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback statement fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`, and hand `result` back.
    ///
    /// A failed rollback is logged; the original error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the caller's error, or the commit failure converted into `E`.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
