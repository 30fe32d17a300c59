//! Structural validation of export documents.
//!
//! `validate` never short-circuits: every missing identity field and the
//! checksum comparison are reported in one pass, each error naming the JSON
//! path it refers to.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{ContentItem, ExportDocument};

/// Error text emitted when the recomputed checksum disagrees with the recorded one.
pub const CHECKSUM_MISMATCH: &str = "Checksum mismatch";

/// Outcome of validating a document or an extracted package.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether any error is an integrity failure rather than a structural one.
    #[must_use]
    pub fn has_checksum_mismatch(&self) -> bool {
        self.errors.iter().any(|e| e.starts_with(CHECKSUM_MISMATCH))
    }

    /// Whether every error is an integrity failure.
    #[must_use]
    pub fn only_checksum_mismatches(&self) -> bool {
        !self.errors.is_empty() && self.errors.iter().all(|e| e.starts_with(CHECKSUM_MISMATCH))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}

fn require<T: ContentItem>(item: &T, path: &str, errors: &mut Vec<String>) {
    let title_field = T::LEVEL.title_field();
    if is_blank(item.title()) {
        errors.push(format!("Missing {path}.{title_field}"));
    }
    if T::LEVEL.children_key().is_some() && is_blank(item.slug()) {
        errors.push(format!("Missing {path}.slug"));
    }
}

/// Validate identity fields, export metadata, and the document checksum.
#[must_use]
pub fn validate(doc: &ExportDocument) -> ValidationReport {
    let mut errors = Vec::new();

    if is_blank(doc.academy.name.as_deref()) {
        errors.push("Missing academy.name".to_string());
    }
    if is_blank(doc.academy.slug.as_deref()) {
        errors.push("Missing academy.slug".to_string());
    }

    for (ci, course) in doc.courses.iter().enumerate() {
        let course_path = format!("courses[{ci}]");
        require(course, &course_path, &mut errors);
        for (mi, module) in course.modules.iter().enumerate() {
            let module_path = format!("{course_path}.modules[{mi}]");
            require(module, &module_path, &mut errors);
            for (li, lesson) in module.lessons.iter().enumerate() {
                let lesson_path = format!("{module_path}.lessons[{li}]");
                require(lesson, &lesson_path, &mut errors);
                for (qi, quiz) in lesson.quizzes.iter().enumerate() {
                    require(quiz, &format!("{lesson_path}.quizzes[{qi}]"), &mut errors);
                }
            }
        }
    }

    let meta = &doc.export_metadata;
    if is_blank(meta.format_version.as_deref()) {
        errors.push("Missing exportMetadata.formatVersion".to_string());
    }
    match meta.checksum.as_deref() {
        None | Some("") => errors.push("Missing exportMetadata.checksum".to_string()),
        Some(recorded) => match doc.compute_checksum() {
            Ok(actual) if actual == recorded => {}
            Ok(_) => errors.push(CHECKSUM_MISMATCH.to_string()),
            Err(e) => errors.push(format!("{CHECKSUM_MISMATCH}: {e}")),
        },
    }

    ValidationReport::from_errors(errors)
}
