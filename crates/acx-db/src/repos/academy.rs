//! Academy repository.

use std::collections::HashSet;

use chrono::Utc;

use acx_core::entities::{Academy, AcademyRecord};
use acx_core::ids::PREFIX_ACADEMY;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, optional_json_text, parse_datetime, parse_json_object, parse_optional_json};
use crate::unit_of_work::UnitOfWork;

const COLUMNS: &str = "id, name, slug, description, version, theme, metadata, is_published, \
                       workflow_state, attributes, created_at, updated_at";

fn row_to_academy(row: &libsql::Row) -> Result<AcademyRecord, DatabaseError> {
    Ok(AcademyRecord {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        slug: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        version: get_opt_string(row, 4)?,
        theme: parse_optional_json(get_opt_string(row, 5)?.as_deref())?,
        metadata: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        is_published: row.get::<i64>(7)? != 0,
        workflow_state: get_opt_string(row, 8)?,
        attributes: parse_json_object(&row.get::<String>(9)?)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

fn required_name(academy: &Academy) -> Result<&str, DatabaseError> {
    academy
        .name
        .as_deref()
        .ok_or_else(|| DatabaseError::InvalidState("academy name is required".into()))
}

impl UnitOfWork {
    /// Insert `academy` under `slug` with a freshly generated id.
    pub async fn insert_academy(
        &self,
        academy: &Academy,
        slug: &str,
    ) -> Result<AcademyRecord, DatabaseError> {
        let now = Utc::now();
        let id = self.generate_id(PREFIX_ACADEMY).await?;
        let attributes = serde_json::to_string(&academy.extra)?;

        self.conn()
            .execute(
                "INSERT INTO academies (id, name, slug, description, version, theme, metadata,
                                        is_published, workflow_state, attributes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                libsql::params![
                    id.as_str(),
                    required_name(academy)?,
                    slug,
                    academy.description.as_deref(),
                    academy.version.as_deref(),
                    optional_json_text(academy.theme.as_ref())?,
                    optional_json_text(academy.metadata.as_ref())?,
                    i64::from(academy.is_published.unwrap_or(false)),
                    academy.workflow_state.as_deref(),
                    attributes,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        self.get_academy(&id).await?.ok_or(DatabaseError::NoResult)
    }

    /// Replace the descriptive fields of academy `id`. Its slug is kept.
    pub async fn update_academy(
        &self,
        id: &str,
        academy: &Academy,
    ) -> Result<AcademyRecord, DatabaseError> {
        let now = Utc::now();
        let attributes = serde_json::to_string(&academy.extra)?;

        let changed = self
            .conn()
            .execute(
                "UPDATE academies
                 SET name = ?1, description = ?2, version = ?3, theme = ?4, metadata = ?5,
                     is_published = ?6, workflow_state = ?7, attributes = ?8, updated_at = ?9
                 WHERE id = ?10",
                libsql::params![
                    required_name(academy)?,
                    academy.description.as_deref(),
                    academy.version.as_deref(),
                    optional_json_text(academy.theme.as_ref())?,
                    optional_json_text(academy.metadata.as_ref())?,
                    i64::from(academy.is_published.unwrap_or(false)),
                    academy.workflow_state.as_deref(),
                    attributes,
                    now.to_rfc3339(),
                    id
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "academy",
                id: id.to_string(),
            });
        }

        self.get_academy(id).await?.ok_or(DatabaseError::NoResult)
    }

    pub async fn get_academy(&self, id: &str) -> Result<Option<AcademyRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {COLUMNS} FROM academies WHERE id = ?1"), [id])
            .await?;
        rows.next().await?.as_ref().map(row_to_academy).transpose()
    }

    pub async fn find_academy_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<AcademyRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {COLUMNS} FROM academies WHERE slug = ?1"), [slug])
            .await?;
        rows.next().await?.as_ref().map(row_to_academy).transpose()
    }

    pub async fn list_academies(&self) -> Result<Vec<AcademyRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {COLUMNS} FROM academies ORDER BY slug"), ())
            .await?;
        let mut academies = Vec::new();
        while let Some(row) = rows.next().await? {
            academies.push(row_to_academy(&row)?);
        }
        Ok(academies)
    }

    /// Academy slugs equal to `base` or of the form `base-<anything>`.
    pub async fn academy_slugs_like(&self, base: &str) -> Result<HashSet<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT slug FROM academies WHERE slug = ?1 OR substr(slug, 1, length(?1) + 1) = ?1 || '-'",
                [base],
            )
            .await?;
        let mut slugs = HashSet::new();
        while let Some(row) = rows.next().await? {
            slugs.insert(row.get::<String>(0)?);
        }
        Ok(slugs)
    }
}
