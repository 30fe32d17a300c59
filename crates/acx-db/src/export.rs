//! Rebuilding an export document from stored rows.
//!
//! Items are rebuilt from their stored bodies with the store's ids as source
//! ids, so parent references in the output always resolve inside it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use acx_core::entities::{
    Academy, AcademyRecord, ContentRecord, Course, ExportDocument, ExportMetadata, Lesson, Module,
    Quiz,
};
use acx_core::enums::ContentLevel;
use acx_core::ids::SourceId;

use crate::error::DatabaseError;
use crate::unit_of_work::UnitOfWork;

fn academy_from_record(record: AcademyRecord) -> Academy {
    Academy {
        id: Some(SourceId::Text(record.id)),
        name: Some(record.name),
        slug: Some(record.slug),
        description: record.description,
        version: record.version,
        theme: record.theme,
        metadata: record.metadata,
        is_published: Some(record.is_published),
        workflow_state: record.workflow_state,
        extra: record.attributes,
    }
}

/// Deserialize `record.body` with its id (and parent id) put back.
fn item_from_record<T: DeserializeOwned>(record: &ContentRecord) -> Result<T, DatabaseError> {
    let mut body = record.body.clone();
    if let Value::Object(map) = &mut body {
        map.insert("id".into(), Value::String(record.id.clone()));
        if let Some(key) = record.level.parent_ref_key() {
            map.insert(key.into(), Value::String(record.parent_id.clone()));
        }
    }
    Ok(serde_json::from_value(body)?)
}

impl UnitOfWork {
    /// Export academy `academy_id` with its settings and full content tree.
    ///
    /// The returned document is sealed and passes validation.
    pub async fn export_academy(
        &self,
        academy_id: &str,
        exported_by: Option<Value>,
    ) -> Result<ExportDocument, DatabaseError> {
        let record = self
            .get_academy(academy_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "academy",
                id: academy_id.to_string(),
            })?;
        let settings = self.get_settings(academy_id).await?.map(|s| s.settings);

        let mut courses = Vec::new();
        for course_row in self.children(ContentLevel::Course, academy_id).await? {
            let mut course: Course = item_from_record(&course_row)?;
            for module_row in self.children(ContentLevel::Module, &course_row.id).await? {
                let mut module: Module = item_from_record(&module_row)?;
                for lesson_row in self.children(ContentLevel::Lesson, &module_row.id).await? {
                    let mut lesson: Lesson = item_from_record(&lesson_row)?;
                    for quiz_row in self.children(ContentLevel::Quiz, &lesson_row.id).await? {
                        lesson.quizzes.push(item_from_record::<Quiz>(&quiz_row)?);
                    }
                    module.lessons.push(lesson);
                }
                course.modules.push(module);
            }
            courses.push(course);
        }

        let mut doc = ExportDocument {
            academy: academy_from_record(record),
            settings,
            courses,
            export_metadata: ExportMetadata {
                exported_by,
                ..ExportMetadata::default()
            },
        };
        doc.seal()?;

        info!(
            academy_id,
            courses = doc.courses.len(),
            "academy exported"
        );
        Ok(doc)
    }
}
