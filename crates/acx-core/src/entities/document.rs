use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum;
use crate::errors::CoreError;
use crate::format::FORMAT_VERSION;
use crate::ids::SourceId;

use super::{Academy, AcademySettings, Course};

/// A full snapshot of one academy, as carried in `data.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub academy: Academy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AcademySettings>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub export_metadata: ExportMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    /// Free-form producer identity, e.g. `{"userId": 1, "userEmail": "..."}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_by: Option<Value>,
    /// Semantic version of the document format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_counts: Option<ContentCounts>,
    /// SHA-256 hex over the canonical form of `{academy, settings, courses}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Number of items per content level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentCounts {
    #[serde(default)]
    pub courses: usize,
    #[serde(default)]
    pub modules: usize,
    #[serde(default)]
    pub lessons: usize,
    #[serde(default)]
    pub quizzes: usize,
}

impl ContentCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.courses + self.modules + self.lessons + self.quizzes
    }
}

/// Identity of an academy as shown in manifests and previews.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AcademySummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExportDocument {
    /// Parse a document from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the text is not a well-formed document.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Count items at every level by walking the tree.
    #[must_use]
    pub fn content_counts(&self) -> ContentCounts {
        let mut counts = ContentCounts {
            courses: self.courses.len(),
            ..ContentCounts::default()
        };
        for course in &self.courses {
            counts.modules += course.modules.len();
            for module in &course.modules {
                counts.lessons += module.lessons.len();
                for lesson in &module.lessons {
                    counts.quizzes += lesson.quizzes.len();
                }
            }
        }
        counts
    }

    /// Canonical checksum of the content-bearing sections.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if a section cannot be converted to JSON.
    pub fn compute_checksum(&self) -> Result<String, CoreError> {
        checksum::document_checksum(&self.academy, self.settings.as_ref(), &self.courses)
    }

    /// Fill in counts, format version, and checksum so the document validates.
    ///
    /// Call after the last mutation; any later change invalidates the checksum.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the checksum cannot be computed.
    pub fn seal(&mut self) -> Result<(), CoreError> {
        let counts = self.content_counts();
        let checksum = self.compute_checksum()?;
        let meta = &mut self.export_metadata;
        if meta.format_version.is_none() {
            meta.format_version = Some(FORMAT_VERSION.to_string());
        }
        if meta.exported_at.is_none() {
            meta.exported_at = Some(Utc::now());
        }
        meta.content_counts = Some(counts);
        meta.checksum = Some(checksum);
        Ok(())
    }

    /// Academy identity for manifests; empty strings stand in for missing fields.
    #[must_use]
    pub fn academy_summary(&self) -> AcademySummary {
        AcademySummary {
            id: self.academy.id.clone(),
            name: self.academy.name.clone().unwrap_or_default(),
            slug: self.academy.slug.clone().unwrap_or_default(),
            version: self.academy.version.clone(),
            description: self.academy.description.clone(),
        }
    }
}
