use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::SourceId;

/// The exported tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Academy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    /// Opaque approval-workflow tag (draft, review, published, archived).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tenant-level settings carried alongside the academy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcademySettings {
    /// `shared` or `dedicated`; defaults to `shared` on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_users: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_storage_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features_enabled: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrations: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AcademySettings {
    /// Tenant mode applied when the document leaves it unset.
    pub const DEFAULT_TENANT_MODE: &'static str = "shared";

    #[must_use]
    pub fn tenant_mode_or_default(&self) -> &str {
        self.tenant_mode
            .as_deref()
            .unwrap_or(Self::DEFAULT_TENANT_MODE)
    }
}
