//! The transactional half of an import.
//!
//! Everything here runs inside one [`UnitOfWork`]. The conflict check is
//! repeated against the transaction's own view before the first write, then
//! the tree is walked top-down in document order. Any error drops out of
//! [`run`] and the unit of work rolls back.

use std::collections::HashSet;

use acx_core::conflict::{
    Conflict, ConflictKind, ExistingItem, detect_conflicts, differs_from, settings_differ,
};
use acx_core::entities::{AcademyRecord, ContentItem, Course, ExportDocument, Lesson, Module, Quiz};
use acx_core::enums::{ContentLevel, Resolution, Severity};
use acx_core::responses::{
    AcademySnapshot, ImportOptions, ImportResult, ImportStats, ImportWarning,
};
use acx_core::slug;
use acx_db::error::DatabaseError;
use acx_db::repos::content::ContentDraft;
use acx_db::service::AcademyStore;
use acx_db::unit_of_work::UnitOfWork;
use tracing::{debug, info, warn};

use crate::error::ImportError;

/// Where an item's children go.
enum Placement {
    /// The item was skipped with its whole subtree.
    Skipped,
    /// Children attach to `id`. `fresh` parents were created by this import.
    Into { id: String, fresh: bool },
}

/// Number of items in a subtree, the item itself included.
trait Subtree {
    fn subtree_size(&self) -> usize;
}

impl Subtree for Course {
    fn subtree_size(&self) -> usize {
        1 + self.modules.iter().map(Subtree::subtree_size).sum::<usize>()
    }
}

impl Subtree for Module {
    fn subtree_size(&self) -> usize {
        1 + self.lessons.iter().map(Subtree::subtree_size).sum::<usize>()
    }
}

impl Subtree for Lesson {
    fn subtree_size(&self) -> usize {
        1 + self.quizzes.len()
    }
}

impl Subtree for Quiz {
    fn subtree_size(&self) -> usize {
        1
    }
}

/// Open a unit of work, import `doc`, and commit, or roll back on any error.
pub(crate) async fn run(
    store: &AcademyStore,
    doc: &ExportDocument,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let uow = store.begin().await?;
    let result = Committer::new(&uow, options).commit(doc).await;
    match &result {
        Ok(imported) => info!(
            academy_id = %imported.academy_id,
            created = imported.stats.created,
            updated = imported.stats.updated,
            skipped = imported.stats.skipped,
            "import committed"
        ),
        Err(e) => warn!(error = %e, "import rolled back"),
    }
    uow.finish(result).await
}

struct Committer<'a> {
    uow: &'a UnitOfWork,
    options: &'a ImportOptions,
    academy_id: String,
    stats: ImportStats,
    warnings: Vec<ImportWarning>,
}

impl<'a> Committer<'a> {
    fn new(uow: &'a UnitOfWork, options: &'a ImportOptions) -> Self {
        Self {
            uow,
            options,
            academy_id: String::new(),
            stats: ImportStats::default(),
            warnings: Vec::new(),
        }
    }

    async fn commit(mut self, doc: &ExportDocument) -> Result<ImportResult, ImportError> {
        self.recheck(doc).await?;

        let academy = self.upsert_academy(doc).await?;
        self.academy_id.clone_from(&academy.id);
        self.upsert_settings(doc).await?;
        self.import_tree(doc).await?;

        Ok(ImportResult {
            academy_id: academy.id.clone(),
            academy: snapshot(academy),
            stats: self.stats,
            warnings: self.warnings,
        })
    }

    /// Re-run detection against the transaction's view of the store.
    async fn recheck(&mut self, doc: &ExportDocument) -> Result<(), ImportError> {
        let ctx = self.uow.target_context(doc, self.options).await?;
        let report = detect_conflicts(doc, &ctx);
        let unresolved = report.unresolved_critical();
        if !unresolved.is_empty() {
            return Err(ImportError::ConflictCritical {
                conflicts: unresolved,
            });
        }
        // Renames surface as slug warnings once applied.
        self.warnings.extend(
            report
                .critical
                .iter()
                .filter(|c| c.resolution != Some(Resolution::Rename))
                .map(|c| ImportWarning::Conflict {
                    code: c.code().to_string(),
                    message: c.message.clone(),
                }),
        );
        Ok(())
    }

    async fn upsert_academy(&mut self, doc: &ExportDocument) -> Result<AcademyRecord, ImportError> {
        if let Some(target_id) = self.options.target_academy_id.as_deref() {
            debug!(academy_id = target_id, "updating target academy");
            return Ok(self.uow.update_academy(target_id, &doc.academy).await?);
        }

        let wanted = doc.academy.slug.as_deref().unwrap_or_default();
        let mut slug = wanted.to_string();
        if let Some(owner) = self.uow.find_academy_by_slug(wanted).await? {
            if !self.options.modify_slugs_on_conflict {
                return Err(academy_slug_conflict(wanted, owner.id));
            }
            let taken = self.uow.academy_slugs_like(wanted).await?;
            slug = slug::resolve(wanted, |s| taken.contains(s));
            self.warnings.push(ImportWarning::AcademySlugModified {
                original: wanted.to_string(),
                resolved: slug.clone(),
            });
        }

        match self.uow.insert_academy(&doc.academy, &slug).await {
            Ok(record) => Ok(record),
            // Lost a race with another writer for the same slug.
            Err(DatabaseError::UniqueViolation(_)) => {
                let owner = self.uow.find_academy_by_slug(&slug).await?;
                Err(academy_slug_conflict(
                    &slug,
                    owner.map(|o| o.id).unwrap_or_default(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_settings(&mut self, doc: &ExportDocument) -> Result<(), ImportError> {
        let Some(incoming) = &doc.settings else {
            return Ok(());
        };
        match self.uow.get_settings(&self.academy_id).await? {
            Some(stored) if !self.options.overwrite_existing => {
                if settings_differ(&stored.settings, incoming) {
                    self.warnings.push(ImportWarning::SettingsRetained {
                        academy_id: self.academy_id.clone(),
                    });
                }
            }
            _ => self.uow.upsert_settings(&self.academy_id, incoming).await?,
        }
        Ok(())
    }

    async fn import_tree(&mut self, doc: &ExportDocument) -> Result<(), ImportError> {
        let academy_id = self.academy_id.clone();
        let fresh_academy = self.options.target_academy_id.is_none();
        let courses = self
            .place(&doc.courses, &academy_id, "courses", fresh_academy)
            .await?;

        for (ci, (course, placement)) in doc.courses.iter().zip(courses).enumerate() {
            let Placement::Into { id, fresh } = placement else {
                continue;
            };
            let course_path = format!("courses[{ci}].modules");
            let modules = self.place(&course.modules, &id, &course_path, fresh).await?;

            for (mi, (module, placement)) in course.modules.iter().zip(modules).enumerate() {
                let Placement::Into { id, fresh } = placement else {
                    continue;
                };
                let module_path = format!("{course_path}[{mi}].lessons");
                let lessons = self.place(&module.lessons, &id, &module_path, fresh).await?;

                for (li, (lesson, placement)) in module.lessons.iter().zip(lessons).enumerate() {
                    let Placement::Into { id, fresh } = placement else {
                        continue;
                    };
                    let lesson_path = format!("{module_path}[{li}].quizzes");
                    self.place(&lesson.quizzes, &id, &lesson_path, fresh).await?;
                }
            }
        }
        Ok(())
    }

    /// Write one sibling list under `parent_id`, applying the collision
    /// policy item by item. Returns where each item's children belong.
    async fn place<T: ContentItem + Subtree>(
        &mut self,
        items: &[T],
        parent_id: &str,
        list_path: &str,
        fresh_parent: bool,
    ) -> Result<Vec<Placement>, ImportError> {
        let level = T::LEVEL;
        let mut placements = Vec::with_capacity(items.len());
        let mut claimed = HashSet::new();

        for (position, item) in items.iter().enumerate() {
            let path = format!("{list_path}[{position}]");
            let Some(key) = item.match_key() else {
                let field = match level {
                    ContentLevel::Quiz => level.title_field(),
                    _ => "slug",
                };
                return Err(ImportError::Validation {
                    errors: vec![format!("Missing {path}.{field}")],
                });
            };

            // Quizzes have no unique key, so a new lesson takes every one of them.
            let existing = if fresh_parent && level == ContentLevel::Quiz {
                None
            } else {
                let mut matches = self.uow.matching_children(level, parent_id, key).await?;
                // Repeated questions pair with stored rows in order, one row each.
                // Slugs stay unique per parent, so a repeated slug still collides.
                if level == ContentLevel::Quiz {
                    matches.retain(|record| !claimed.contains(&record.id));
                }
                matches.into_iter().next()
            };

            let Some(existing) = existing else {
                let draft = ContentDraft::from_item(item, None, position)?;
                let id = self.uow.insert_content(&draft, parent_id, &self.academy_id).await?;
                debug!(%level, %path, %id, "created");
                self.stats.created += 1;
                claimed.insert(id.clone());
                placements.push(Placement::Into { id, fresh: true });
                continue;
            };
            claimed.insert(existing.id.clone());

            let differs = differs_from(
                item,
                &ExistingItem {
                    id: existing.id.clone(),
                    content_hash: existing.content_hash.clone(),
                },
            );
            match self.options.collision_resolution(differs) {
                Some(Resolution::Skip) => {
                    let skipped = item.subtree_size();
                    debug!(%level, %path, skipped, "skipped");
                    self.stats.skipped += skipped;
                    self.warnings.push(ImportWarning::ContentSkipped {
                        level,
                        path,
                        items: skipped,
                    });
                    placements.push(Placement::Skipped);
                }
                Some(Resolution::Overwrite) => {
                    let draft = ContentDraft::from_item(item, existing.slug.as_deref(), position)?;
                    self.uow.update_content(&existing.id, &draft).await?;
                    debug!(%level, %path, id = %existing.id, "updated");
                    self.stats.updated += 1;
                    placements.push(Placement::Into {
                        id: existing.id,
                        fresh: false,
                    });
                }
                Some(Resolution::Rename) => {
                    let draft = if level == ContentLevel::Quiz {
                        ContentDraft::from_item(item, None, position)?
                    } else {
                        let taken = self.uow.child_slugs_like(level, parent_id, key).await?;
                        let resolved = slug::resolve(key, |s| taken.contains(s));
                        self.warnings.push(ImportWarning::SlugModified {
                            level,
                            path: path.clone(),
                            original: key.to_string(),
                            resolved: resolved.clone(),
                        });
                        ContentDraft::from_item(item, Some(&resolved), position)?
                    };
                    let id = self.uow.insert_content(&draft, parent_id, &self.academy_id).await?;
                    debug!(%level, %path, %id, "created under a new slug");
                    self.stats.created += 1;
                    claimed.insert(id.clone());
                    placements.push(Placement::Into { id, fresh: true });
                }
                Some(Resolution::KeepExisting) => {
                    debug!(%level, %path, id = %existing.id, "identical, reused");
                    self.stats.skipped += 1;
                    self.warnings
                        .push(ImportWarning::ContentUnchanged { level, path });
                    placements.push(Placement::Into {
                        id: existing.id,
                        fresh: false,
                    });
                }
                Some(Resolution::KeepTargetSlug) | None => {
                    let kind = ConflictKind::content(level, path, key.to_string(), existing.id, differs);
                    return Err(ImportError::ConflictCritical {
                        conflicts: vec![Conflict::new(kind, Severity::Critical, None)],
                    });
                }
            }
        }
        Ok(placements)
    }
}

fn academy_slug_conflict(slug: &str, existing_id: String) -> ImportError {
    let kind = ConflictKind::AcademySlugConflict {
        slug: slug.to_string(),
        existing_id,
    };
    ImportError::ConflictCritical {
        conflicts: vec![Conflict::new(kind, Severity::Critical, None)],
    }
}

fn snapshot(record: AcademyRecord) -> AcademySnapshot {
    AcademySnapshot {
        id: record.id,
        name: record.name,
        slug: record.slug,
        version: record.version,
        workflow_state: record.workflow_state,
    }
}
