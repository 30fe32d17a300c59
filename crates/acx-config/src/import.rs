//! Default conflict policy for imports.

use acx_core::responses::ImportOptions;
use serde::{Deserialize, Serialize};

const fn default_modify_slugs() -> bool {
    true
}

/// Policy flags applied when the caller does not override them.
///
/// The target academy is always chosen per call, so it has no config key.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImportConfig {
    #[serde(default)]
    pub overwrite_existing: bool,

    #[serde(default = "default_modify_slugs")]
    pub modify_slugs_on_conflict: bool,

    #[serde(default)]
    pub skip_conflicting_content: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            modify_slugs_on_conflict: default_modify_slugs(),
            skip_conflicting_content: false,
        }
    }
}

impl ImportConfig {
    /// Import options seeded from this policy.
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            overwrite_existing: self.overwrite_existing,
            modify_slugs_on_conflict: self.modify_slugs_on_conflict,
            skip_conflicting_content: self.skip_conflicting_content,
            target_academy_id: None,
        }
    }
}
