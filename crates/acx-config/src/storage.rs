//! Filesystem locations for packages and scratch space.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_packages_dir() -> PathBuf {
    PathBuf::from(".acx/packages")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(".acx/tmp")
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding built archives and their sidecar manifests.
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,

    /// Parent directory for per-import extraction directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            packages_dir: default_packages_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_dot_acx() {
        let config = StorageConfig::default();
        assert!(config.packages_dir.starts_with(".acx"));
        assert!(config.temp_dir.starts_with(".acx"));
        assert_ne!(config.packages_dir, config.temp_dir);
    }
}
