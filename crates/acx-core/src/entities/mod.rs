//! Entity structs for the export document and the persisted store.
//!
//! Export-side structs use camelCase JSON keys and keep every field optional:
//! documents arrive from other instances and are validated after parsing, so a
//! missing identity field must surface as a validation error rather than a
//! parse failure. Unknown keys are preserved in each item's `extra` map.

mod academy;
mod content;
mod document;
mod records;

pub use academy::{Academy, AcademySettings};
pub use content::{ContentItem, Course, Lesson, Module, Quiz};
pub use document::{AcademySummary, ContentCounts, ExportDocument, ExportMetadata};
pub use records::{AcademyRecord, ContentRecord, SettingsRecord};
