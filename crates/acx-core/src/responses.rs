//! Import options and the result types returned by preview and import.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conflict::Conflict;
use crate::entities::{AcademySummary, ContentCounts};
use crate::enums::{ContentLevel, Resolution};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Caller-chosen conflict policy for an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Update existing items in place when their slug collides.
    pub overwrite_existing: bool,
    /// Pick a free `-N` suffixed slug instead of failing on a collision.
    pub modify_slugs_on_conflict: bool,
    /// Leave colliding items (and their subtrees) untouched.
    pub skip_conflicting_content: bool,
    /// Import into this existing academy instead of creating a new one.
    pub target_academy_id: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            modify_slugs_on_conflict: true,
            skip_conflicting_content: false,
            target_academy_id: None,
        }
    }
}

impl ImportOptions {
    /// How a content item whose key collides with a persisted sibling is
    /// handled. `differs` is whether the two carry different content.
    ///
    /// Skip wins over overwrite, overwrite over rename. An identical item is
    /// reused when no explicit policy applies; `None` means the collision is
    /// unresolvable.
    #[must_use]
    pub const fn collision_resolution(&self, differs: bool) -> Option<Resolution> {
        if self.skip_conflicting_content {
            Some(Resolution::Skip)
        } else if self.overwrite_existing {
            Some(Resolution::Overwrite)
        } else if self.modify_slugs_on_conflict {
            Some(Resolution::Rename)
        } else if !differs {
            Some(Resolution::KeepExisting)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Content item tallies for one import. The academy and its settings are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ImportStats {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}

/// A non-fatal event recorded while importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportWarning {
    AcademySlugModified {
        original: String,
        resolved: String,
    },
    SlugModified {
        level: ContentLevel,
        path: String,
        original: String,
        resolved: String,
    },
    /// A colliding item was left alone; `items` counts it and its descendants.
    ContentSkipped {
        level: ContentLevel,
        path: String,
        items: usize,
    },
    /// A colliding item matched the persisted one and was reused.
    ContentUnchanged {
        level: ContentLevel,
        path: String,
    },
    SettingsRetained {
        academy_id: String,
    },
    Conflict {
        code: String,
        message: String,
    },
}

impl ImportWarning {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AcademySlugModified { original, resolved } => {
                format!("academy slug '{original}' already in use, imported as '{resolved}'")
            }
            Self::SlugModified {
                level,
                path,
                original,
                resolved,
            } => format!("{level} '{path}': slug '{original}' already in use, imported as '{resolved}'"),
            Self::ContentSkipped { level, path, items } => {
                format!("{level} '{path}' already exists, skipped {items} item(s)")
            }
            Self::ContentUnchanged { level, path } => {
                format!("{level} '{path}' already exists with identical content, reused")
            }
            Self::SettingsRetained { academy_id } => {
                format!("academy {academy_id} already has settings, kept existing")
            }
            Self::Conflict { message, .. } => message.clone(),
        }
    }
}

/// The academy row an import landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcademySnapshot {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub version: Option<String>,
    pub workflow_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub academy_id: String,
    pub academy: AcademySnapshot,
    pub stats: ImportStats,
    pub warnings: Vec<ImportWarning>,
}

/// Read-only forecast of an import.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub package_id: String,
    pub format_version: Option<String>,
    pub academy: AcademySummary,
    pub conflicts: Vec<Conflict>,
    pub stats: ContentCounts,
    pub can_import: bool,
}
