//! Course, module, lesson, and quiz repository.
//!
//! The four content tables share one shape, so every method takes the
//! `ContentLevel` and derives table and parent column from it.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;

use acx_core::entities::{ContentCounts, ContentItem, ContentRecord};
use acx_core::enums::ContentLevel;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::unit_of_work::UnitOfWork;

/// A content row about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub level: ContentLevel,
    pub slug: Option<String>,
    pub title: String,
    pub position: i64,
    pub is_published: bool,
    pub workflow_state: Option<String>,
    pub content_hash: String,
    pub body: Value,
}

impl ContentDraft {
    /// Draft for `item` at array index `position`, stored under `slug` when
    /// given (a renamed item) and under its own slug otherwise.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the item has no title (or
    /// question), or an error if its body cannot be serialized.
    pub fn from_item<T: ContentItem>(
        item: &T,
        slug: Option<&str>,
        position: usize,
    ) -> Result<Self, DatabaseError> {
        let title = item.title().ok_or_else(|| {
            DatabaseError::InvalidState(format!(
                "{} without {}",
                T::LEVEL,
                T::LEVEL.title_field()
            ))
        })?;
        let mut body = item.body()?;
        if let (Some(slug), Value::Object(map)) = (slug, &mut body) {
            map.insert("slug".into(), Value::String(slug.to_string()));
        }
        Ok(Self {
            level: T::LEVEL,
            slug: slug.or(item.slug()).map(String::from),
            title: title.to_string(),
            position: i64::try_from(position).unwrap_or(i64::MAX),
            is_published: item.is_published(),
            workflow_state: item.workflow_state().map(String::from),
            content_hash: item.fingerprint()?,
            body,
        })
    }
}

fn select_columns(level: ContentLevel) -> String {
    format!(
        "id, {parent}, academy_id, slug, title, position, is_published, workflow_state, \
         content_hash, body, created_at, updated_at",
        parent = level.parent_column()
    )
}

fn row_to_content(level: ContentLevel, row: &libsql::Row) -> Result<ContentRecord, DatabaseError> {
    Ok(ContentRecord {
        id: row.get::<String>(0)?,
        level,
        parent_id: row.get::<String>(1)?,
        academy_id: row.get::<String>(2)?,
        slug: get_opt_string(row, 3)?,
        title: row.get::<String>(4)?,
        position: row.get::<i64>(5)?,
        is_published: row.get::<i64>(6)? != 0,
        workflow_state: get_opt_string(row, 7)?,
        content_hash: row.get::<String>(8)?,
        body: serde_json::from_str(&row.get::<String>(9)?)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

impl UnitOfWork {
    /// Insert `draft` under `parent_id` and return the generated id.
    ///
    /// For courses the parent is the academy itself.
    pub async fn insert_content(
        &self,
        draft: &ContentDraft,
        parent_id: &str,
        academy_id: &str,
    ) -> Result<String, DatabaseError> {
        let level = draft.level;
        let id = self.generate_id(level.id_prefix()).await?;
        let now = Utc::now().to_rfc3339();

        let mut columns = vec!["id", level.parent_column()];
        let mut params: Vec<libsql::Value> = vec![id.as_str().into(), parent_id.into()];
        if level != ContentLevel::Course {
            columns.push("academy_id");
            params.push(academy_id.into());
        }
        columns.extend([
            "slug",
            "title",
            "position",
            "is_published",
            "workflow_state",
            "content_hash",
            "body",
            "created_at",
            "updated_at",
        ]);
        params.extend([
            draft.slug.as_deref().into(),
            draft.title.as_str().into(),
            draft.position.into(),
            i64::from(draft.is_published).into(),
            draft.workflow_state.as_deref().into(),
            draft.content_hash.as_str().into(),
            serde_json::to_string(&draft.body)?.into(),
            now.as_str().into(),
            now.as_str().into(),
        ]);

        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            level.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(id)
    }

    /// Overwrite row `id` with `draft`. The stored slug and parent are kept.
    pub async fn update_content(&self, id: &str, draft: &ContentDraft) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE {} SET title = ?1, position = ?2, is_published = ?3, workflow_state = ?4,
                 content_hash = ?5, body = ?6, updated_at = ?7
             WHERE id = ?8",
            draft.level.table()
        );
        let changed = self
            .conn()
            .execute(
                &sql,
                libsql::params![
                    draft.title.as_str(),
                    draft.position,
                    i64::from(draft.is_published),
                    draft.workflow_state.as_deref(),
                    draft.content_hash.as_str(),
                    serde_json::to_string(&draft.body)?,
                    now,
                    id
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: draft.level.as_str(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Children of `parent_id` whose match key (slug, or question for
    /// quizzes) equals `key`, in stored order. Slugs match at most one row;
    /// quiz questions may repeat.
    pub async fn matching_children(
        &self,
        level: ContentLevel,
        parent_id: &str,
        key: &str,
    ) -> Result<Vec<ContentRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 AND {} = ?2 ORDER BY position, rowid",
            select_columns(level),
            level.table(),
            level.parent_column(),
            level.key_column()
        );
        let mut rows = self.conn().query(&sql, [parent_id, key]).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_content(level, &row)?);
        }
        Ok(records)
    }

    /// Children of `parent_id` in stored order.
    pub async fn children(
        &self,
        level: ContentLevel,
        parent_id: &str,
    ) -> Result<Vec<ContentRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY position, rowid",
            select_columns(level),
            level.table(),
            level.parent_column()
        );
        let mut rows = self.conn().query(&sql, [parent_id]).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_content(level, &row)?);
        }
        Ok(records)
    }

    /// Sibling slugs under `parent_id` equal to `base` or of the form `base-<anything>`.
    pub async fn child_slugs_like(
        &self,
        level: ContentLevel,
        parent_id: &str,
        base: &str,
    ) -> Result<HashSet<String>, DatabaseError> {
        let sql = format!(
            "SELECT slug FROM {} WHERE {} = ?1
               AND (slug = ?2 OR substr(slug, 1, length(?2) + 1) = ?2 || '-')",
            level.table(),
            level.parent_column()
        );
        let mut rows = self.conn().query(&sql, [parent_id, base]).await?;
        let mut slugs = HashSet::new();
        while let Some(row) = rows.next().await? {
            slugs.insert(row.get::<String>(0)?);
        }
        Ok(slugs)
    }

    /// Number of stored items per level under `academy_id`.
    pub async fn academy_counts(&self, academy_id: &str) -> Result<ContentCounts, DatabaseError> {
        let mut counts = ContentCounts::default();
        for level in ContentLevel::ALL {
            let mut rows = self
                .conn()
                .query(
                    &format!("SELECT COUNT(*) FROM {} WHERE academy_id = ?1", level.table()),
                    [academy_id],
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let n = usize::try_from(row.get::<i64>(0)?).unwrap_or_default();
            match level {
                ContentLevel::Course => counts.courses = n,
                ContentLevel::Module => counts.modules = n,
                ContentLevel::Lesson => counts.lessons = n,
                ContentLevel::Quiz => counts.quizzes = n,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AcademyStore;
    use acx_core::entities::{Academy, Course, Module, Quiz};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn academy_in(uow: &UnitOfWork) -> String {
        let academy = Academy {
            name: Some("A".into()),
            ..Academy::default()
        };
        uow.insert_academy(&academy, "a").await.unwrap().id
    }

    fn course(slug: &str) -> Course {
        Course {
            title: Some(format!("Course {slug}")),
            slug: Some(slug.into()),
            workflow_state: Some("draft".into()),
            ..Course::default()
        }
    }

    #[tokio::test]
    async fn insert_find_and_update() {
        let store = AcademyStore::open_local(":memory:").await.unwrap();
        let uow = store.begin().await.unwrap();
        let academy_id = academy_in(&uow).await;

        let draft = ContentDraft::from_item(&course("intro"), Some("intro"), 0).unwrap();
        let id = uow.insert_content(&draft, &academy_id, &academy_id).await.unwrap();
        assert!(id.starts_with("crs-"));

        let found = uow
            .matching_children(ContentLevel::Course, &academy_id, "intro")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(found.id, id);
        assert_eq!(found.parent_id, academy_id);
        assert_eq!(found.workflow_state.as_deref(), Some("draft"));
        assert_eq!(found.body["title"], json!("Course intro"));

        let mut edited = course("intro");
        edited.description = Some("now with words".into());
        let draft = ContentDraft::from_item(&edited, Some("intro"), 3).unwrap();
        uow.update_content(&id, &draft).await.unwrap();
        let found = uow
            .matching_children(ContentLevel::Course, &academy_id, "intro")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(found.position, 3);
        assert_eq!(found.content_hash, edited.fingerprint().unwrap());
    }

    #[test]
    fn quiz_draft_has_no_slug() {
        let quiz = Quiz {
            question: Some("Why?".into()),
            ..Quiz::default()
        };
        let draft = ContentDraft::from_item(&quiz, None, 0).unwrap();
        assert_eq!(draft.slug, None);
        assert_eq!(draft.title, "Why?");
        assert!(ContentDraft::from_item(&Quiz::default(), None, 0).is_err());
    }

    #[test]
    fn renamed_draft_rewrites_body_slug_only() {
        let item = course("intro");
        let draft = ContentDraft::from_item(&item, Some("intro-2"), 0).unwrap();
        assert_eq!(draft.body["slug"], json!("intro-2"));
        assert_eq!(draft.content_hash, item.fingerprint().unwrap());
    }

    #[tokio::test]
    async fn sibling_slugs_are_unique_per_parent() {
        let store = AcademyStore::open_local(":memory:").await.unwrap();
        let uow = store.begin().await.unwrap();
        let academy_id = academy_in(&uow).await;
        let draft = ContentDraft::from_item(&course("intro"), Some("intro"), 0).unwrap();
        uow.insert_content(&draft, &academy_id, &academy_id).await.unwrap();
        let err = uow
            .insert_content(&draft, &academy_id, &academy_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)), "{err}");
    }

    #[tokio::test]
    async fn children_follow_position_and_counts_by_level() {
        let store = AcademyStore::open_local(":memory:").await.unwrap();
        let uow = store.begin().await.unwrap();
        let academy_id = academy_in(&uow).await;
        let course_id = uow
            .insert_content(
                &ContentDraft::from_item(&course("c"), Some("c"), 0).unwrap(),
                &academy_id,
                &academy_id,
            )
            .await
            .unwrap();
        for (i, slug) in ["b", "a"].iter().enumerate() {
            let module = Module {
                title: Some(slug.to_string()),
                slug: Some(slug.to_string()),
                ..Module::default()
            };
            uow.insert_content(
                &ContentDraft::from_item(&module, Some(*slug), i).unwrap(),
                &course_id,
                &academy_id,
            )
            .await
            .unwrap();
        }

        let modules = uow.children(ContentLevel::Module, &course_id).await.unwrap();
        let slugs: Vec<_> = modules.iter().filter_map(|m| m.slug.as_deref()).collect();
        assert_eq!(slugs, vec!["b", "a"], "stored order follows position");

        let counts = uow.academy_counts(&academy_id).await.unwrap();
        assert_eq!(counts.courses, 1);
        assert_eq!(counts.modules, 2);
        assert_eq!(counts.quizzes, 0);
    }

    #[tokio::test]
    async fn repeated_quiz_questions_all_match_in_order() {
        let store = AcademyStore::open_local(":memory:").await.unwrap();
        let uow = store.begin().await.unwrap();
        let academy_id = academy_in(&uow).await;
        let mut parent_id = academy_id.clone();
        for level in [ContentLevel::Course, ContentLevel::Module, ContentLevel::Lesson] {
            let draft = ContentDraft {
                level,
                ..ContentDraft::from_item(&course("p"), Some("p"), 0).unwrap()
            };
            parent_id = uow.insert_content(&draft, &parent_id, &academy_id).await.unwrap();
        }

        let mut ids = Vec::new();
        for (i, answer) in ["yes", "no"].iter().enumerate() {
            let quiz = Quiz {
                question: Some("True or false?".into()),
                correct_answer: Some(json!(answer)),
                ..Quiz::default()
            };
            let draft = ContentDraft::from_item(&quiz, None, i).unwrap();
            ids.push(uow.insert_content(&draft, &parent_id, &academy_id).await.unwrap());
        }

        let found: Vec<_> = uow
            .matching_children(ContentLevel::Quiz, &parent_id, "True or false?")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(found, ids);
    }
}
