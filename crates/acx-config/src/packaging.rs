//! Archive building defaults.

use acx_core::enums::{Compression, PackageFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PackagingConfig {
    #[serde(default)]
    pub format: PackageFormat,

    /// `low`, `default`, or `high`.
    #[serde(default)]
    pub compression: Compression,
}
