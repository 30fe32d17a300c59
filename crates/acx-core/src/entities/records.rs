use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::ContentLevel;

use super::AcademySettings;

/// A persisted academy row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AcademyRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub theme: Option<Value>,
    pub metadata: Option<Value>,
    pub is_published: bool,
    pub workflow_state: Option<String>,
    /// Producer fields without a dedicated column.
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted `academy_settings` row (one per academy).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SettingsRecord {
    pub academy_id: String,
    pub settings: AcademySettings,
    pub updated_at: DateTime<Utc>,
}

/// A persisted course, module, lesson, or quiz row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ContentRecord {
    pub id: String,
    pub level: ContentLevel,
    /// Parent row id (the academy for courses).
    pub parent_id: String,
    pub academy_id: String,
    pub slug: Option<String>,
    pub title: String,
    /// Index in the parent's array at import time.
    pub position: i64,
    pub is_published: bool,
    pub workflow_state: Option<String>,
    pub content_hash: String,
    /// The item JSON without id, parent reference, or children.
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
