//! Academy settings repository (one row per academy).

use chrono::Utc;

use acx_core::entities::{AcademySettings, SettingsRecord};

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::unit_of_work::UnitOfWork;

impl UnitOfWork {
    pub async fn get_settings(
        &self,
        academy_id: &str,
    ) -> Result<Option<SettingsRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT academy_id, settings, updated_at FROM academy_settings WHERE academy_id = ?1",
                [academy_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(SettingsRecord {
            academy_id: row.get::<String>(0)?,
            settings: serde_json::from_str(&row.get::<String>(1)?)?,
            updated_at: parse_datetime(&row.get::<String>(2)?)?,
        }))
    }

    /// Insert or replace the settings of `academy_id`.
    ///
    /// The JSON is stored as given; `tenant_mode` falls back to `shared` only
    /// in its indexed column.
    pub async fn upsert_settings(
        &self,
        academy_id: &str,
        settings: &AcademySettings,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now();
        self.conn()
            .execute(
                "INSERT INTO academy_settings (academy_id, tenant_mode, settings, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(academy_id) DO UPDATE SET
                     tenant_mode = excluded.tenant_mode,
                     settings = excluded.settings,
                     updated_at = excluded.updated_at",
                libsql::params![
                    academy_id,
                    settings.tenant_mode_or_default(),
                    serde_json::to_string(settings)?,
                    now.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }
}
