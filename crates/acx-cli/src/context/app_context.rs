use std::sync::Arc;

use acx_config::AcxConfig;
use acx_db::service::AcademyStore;
use acx_import::ImportOrchestrator;
use acx_package::PackageStore;
use anyhow::Context;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: AcxConfig,
    pub store: Arc<AcademyStore>,
    pub orchestrator: ImportOrchestrator,
}

impl AppContext {
    /// Open the store and wire the orchestrator to the configured roots.
    pub async fn init(config: AcxConfig) -> anyhow::Result<Self> {
        let db_path = &config.database.path;
        if !config.database.is_in_memory()
            && let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let store = AcademyStore::open_local(&db_path.to_string_lossy())
            .await
            .with_context(|| format!("failed to open store at {}", db_path.display()))?;
        tracing::debug!(path = %db_path.display(), "store opened");
        let store = Arc::new(store);
        let orchestrator = ImportOrchestrator::new(
            Arc::clone(&store),
            packages(&config),
            config.storage.temp_dir.clone(),
        );

        Ok(Self {
            config,
            store,
            orchestrator,
        })
    }

    #[must_use]
    pub fn packages(&self) -> &PackageStore {
        self.orchestrator.packages()
    }
}

/// The package store rooted at `storage.packages_dir`.
pub fn packages(config: &AcxConfig) -> PackageStore {
    PackageStore::new(config.storage.packages_dir.clone())
}
