//! Snapshot of store state for conflict detection.

use acx_core::conflict::{
    AcademyRef, ExistingContent, ExistingItem, SiblingKeys, TargetContext,
};
use acx_core::entities::{AcademyRecord, ExportDocument};
use acx_core::enums::ContentLevel;
use acx_core::format::SUPPORTED_MAJOR;
use acx_core::responses::ImportOptions;

use crate::error::DatabaseError;
use crate::unit_of_work::UnitOfWork;

fn academy_ref(record: AcademyRecord) -> AcademyRef {
    AcademyRef {
        id: record.id,
        slug: record.slug,
        name: record.name,
    }
}

impl UnitOfWork {
    /// Collect the slug owner, the target academy, its settings, and its
    /// content tree keyed by match-key path.
    pub async fn target_context(
        &self,
        doc: &ExportDocument,
        options: &ImportOptions,
    ) -> Result<TargetContext, DatabaseError> {
        let slug_owner = match doc.academy.slug.as_deref() {
            Some(slug) => self.find_academy_by_slug(slug).await?.map(academy_ref),
            None => None,
        };
        let target = match options.target_academy_id.as_deref() {
            Some(id) => self.get_academy(id).await?.map(academy_ref),
            None => None,
        };

        let mut ctx = TargetContext {
            supported_major: SUPPORTED_MAJOR,
            options: options.clone(),
            slug_owner,
            target: None,
            target_settings: None,
            existing: ExistingContent::default(),
        };
        if let Some(target) = target {
            ctx.target_settings = self.get_settings(&target.id).await?.map(|s| s.settings);
            ctx.existing = self.existing_content(&target.id).await?;
            ctx.target = Some(target);
        }
        Ok(ctx)
    }

    /// Every stored item under `academy_id`, keyed by its chain of match keys.
    pub async fn existing_content(&self, academy_id: &str) -> Result<ExistingContent, DatabaseError> {
        let mut existing = ExistingContent::default();
        // (parent id, path of the parent) pairs for the level being walked.
        let mut frontier = vec![(academy_id.to_string(), Vec::<String>::new())];
        for level in ContentLevel::ALL {
            let mut next = Vec::new();
            for (parent_id, parent_path) in &frontier {
                let records = self.children(level, parent_id).await?;
                let mut keys = SiblingKeys::default();
                for record in &records {
                    let key = match level {
                        ContentLevel::Quiz => Some(record.title.as_str()),
                        _ => record.slug.as_deref(),
                    };
                    let Some(key) = key else { continue };
                    let mut path = parent_path.clone();
                    path.push(keys.segment(key));
                    existing.insert(
                        path.clone(),
                        ExistingItem {
                            id: record.id.clone(),
                            content_hash: record.content_hash.clone(),
                        },
                    );
                    next.push((record.id.clone(), path));
                }
            }
            frontier = next;
        }
        Ok(existing)
    }
}
