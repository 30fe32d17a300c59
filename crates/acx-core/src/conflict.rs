//! Conflict detection between an incoming export document and the state of
//! the target store.
//!
//! Detection is pure: the store is snapshotted into a [`TargetContext`]
//! first, so the same check serves both preview and the in-transaction guard
//! that runs right before the first write.

use std::collections::{BTreeMap, HashMap, HashSet};

use schemars::JsonSchema;
use serde::Serialize;

use crate::checksum::canonical_json;
use crate::entities::{AcademySettings, ContentItem, Course, ExportDocument, Lesson, Module, Quiz};
use crate::enums::{ContentLevel, Resolution, Severity};
use crate::format;
use crate::responses::ImportOptions;

// ---------------------------------------------------------------------------
// Conflict types
// ---------------------------------------------------------------------------

/// What was detected, with the structured payload needed to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictKind {
    AcademySlugConflict {
        slug: String,
        existing_id: String,
    },
    CourseSlugConflict {
        path: String,
        slug: String,
        existing_id: String,
        differs: bool,
    },
    ModuleSlugConflict {
        path: String,
        slug: String,
        existing_id: String,
        differs: bool,
    },
    LessonSlugConflict {
        path: String,
        slug: String,
        existing_id: String,
        differs: bool,
    },
    QuizConflict {
        path: String,
        question: String,
        existing_id: String,
        differs: bool,
    },
    SettingsConflict {
        academy_id: String,
    },
    UnsupportedFormatVersion {
        found: Option<String>,
        supported_major: u64,
    },
    DanglingReference {
        level: ContentLevel,
        path: String,
        reference: String,
    },
    /// The parent reference names another item of the document, not the one
    /// the item is nested under.
    MisplacedReference {
        level: ContentLevel,
        path: String,
        reference: String,
        parent_id: String,
    },
    DuplicateSlug {
        level: ContentLevel,
        slug: String,
        path: String,
    },
    TargetAcademyMissing {
        academy_id: String,
    },
}

impl ConflictKind {
    /// Machine-readable code, identical to the serialized `type` tag.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AcademySlugConflict { .. } => "academy_slug_conflict",
            Self::CourseSlugConflict { .. } => "course_slug_conflict",
            Self::ModuleSlugConflict { .. } => "module_slug_conflict",
            Self::LessonSlugConflict { .. } => "lesson_slug_conflict",
            Self::QuizConflict { .. } => "quiz_conflict",
            Self::SettingsConflict { .. } => "settings_conflict",
            Self::UnsupportedFormatVersion { .. } => "unsupported_format_version",
            Self::DanglingReference { .. } => "dangling_reference",
            Self::MisplacedReference { .. } => "misplaced_reference",
            Self::DuplicateSlug { .. } => "duplicate_slug",
            Self::TargetAcademyMissing { .. } => "target_academy_missing",
        }
    }

    /// The slug (or quiz) collision variant for `level`.
    #[must_use]
    pub fn content(
        level: ContentLevel,
        path: String,
        key: String,
        existing_id: String,
        differs: bool,
    ) -> Self {
        match level {
            ContentLevel::Course => Self::CourseSlugConflict {
                path,
                slug: key,
                existing_id,
                differs,
            },
            ContentLevel::Module => Self::ModuleSlugConflict {
                path,
                slug: key,
                existing_id,
                differs,
            },
            ContentLevel::Lesson => Self::LessonSlugConflict {
                path,
                slug: key,
                existing_id,
                differs,
            },
            ContentLevel::Quiz => Self::QuizConflict {
                path,
                question: key,
                existing_id,
                differs,
            },
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AcademySlugConflict { slug, existing_id } => {
                format!("academy slug '{slug}' is already used by academy {existing_id}")
            }
            Self::CourseSlugConflict { path, differs, .. }
            | Self::ModuleSlugConflict { path, differs, .. }
            | Self::LessonSlugConflict { path, differs, .. } => {
                let what = if *differs { "different" } else { "identical" };
                format!("'{path}' already exists in the target academy with {what} content")
            }
            Self::QuizConflict { path, differs, .. } => {
                let what = if *differs { "different" } else { "identical" };
                format!("quiz '{path}' already exists with {what} content")
            }
            Self::SettingsConflict { academy_id } => {
                format!("incoming settings differ from the stored settings of academy {academy_id}")
            }
            Self::UnsupportedFormatVersion {
                found,
                supported_major,
            } => format!(
                "format version {} is not supported (expected {supported_major}.x)",
                found.as_deref().unwrap_or("<missing>")
            ),
            Self::DanglingReference {
                level,
                path,
                reference,
            } => format!("{level} at {path} references id {reference} which is not in the document"),
            Self::MisplacedReference {
                level,
                path,
                reference,
                parent_id,
            } => format!("{level} at {path} references id {reference} but is nested under {parent_id}"),
            Self::DuplicateSlug {
                level: ContentLevel::Quiz,
                slug,
                path,
            } => format!("quiz question '{slug}' appears more than once among siblings ({path})"),
            Self::DuplicateSlug { level, slug, path } => {
                format!("{level} slug '{slug}' appears more than once among siblings ({path})")
            }
            Self::TargetAcademyMissing { academy_id } => {
                format!("target academy {academy_id} does not exist")
            }
        }
    }
}

/// A classified conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Conflict {
    #[serde(flatten)]
    pub kind: ConflictKind,
    pub severity: Severity,
    pub message: String,
    /// What the import policy will do about it; `None` when nothing can.
    pub resolution: Option<Resolution>,
}

impl Conflict {
    #[must_use]
    pub fn new(kind: ConflictKind, severity: Severity, resolution: Option<Resolution>) -> Self {
        Self {
            message: kind.message(),
            kind,
            severity,
            resolution,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConflictReport {
    pub critical: Vec<Conflict>,
    pub warnings: Vec<Conflict>,
}

impl ConflictReport {
    pub fn push(&mut self, conflict: Conflict) {
        match conflict.severity {
            Severity::Critical => self.critical.push(conflict),
            Severity::Warning => self.warnings.push(conflict),
        }
    }

    #[must_use]
    pub fn can_import(&self) -> bool {
        self.critical.is_empty()
    }

    /// Critical conflicts the import policy cannot settle.
    #[must_use]
    pub fn unresolved_critical(&self) -> Vec<Conflict> {
        self.critical
            .iter()
            .filter(|c| c.resolution.is_none())
            .cloned()
            .collect()
    }

    /// All conflicts, critical first.
    #[must_use]
    pub fn into_all(self) -> Vec<Conflict> {
        let mut all = self.critical;
        all.extend(self.warnings);
        all
    }
}

// ---------------------------------------------------------------------------
// Target snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademyRef {
    pub id: String,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingItem {
    pub id: String,
    pub content_hash: String,
}

/// Path segment for the `occurrence`-th sibling (zero-based) sharing `key`.
/// Quiz questions may repeat under one lesson; the nth incoming quiz with a
/// question pairs with the nth stored one.
#[must_use]
pub fn sibling_key(key: &str, occurrence: usize) -> String {
    if occurrence == 0 {
        key.to_string()
    } else {
        format!("{key}#{}", occurrence + 1)
    }
}

/// Numbers repeated keys among one sibling list.
#[derive(Debug, Default)]
pub struct SiblingKeys<'a> {
    seen: HashMap<&'a str, usize>,
}

impl<'a> SiblingKeys<'a> {
    /// The path segment for the next sibling carrying `key`.
    pub fn segment(&mut self, key: &'a str) -> String {
        let occurrence = self.seen.entry(key).or_insert(0);
        let segment = sibling_key(key, *occurrence);
        *occurrence += 1;
        segment
    }
}

/// Persisted content of the target academy, keyed by the chain of match keys
/// from the course down (slugs, then the question text for quizzes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingContent {
    items: BTreeMap<Vec<String>, ExistingItem>,
}

impl ExistingContent {
    pub fn insert(&mut self, path: Vec<String>, item: ExistingItem) {
        self.items.insert(path, item);
    }

    #[must_use]
    pub fn get(&self, path: &[String]) -> Option<&ExistingItem> {
        self.items.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything conflict detection needs to know about the store.
#[derive(Debug, Clone)]
pub struct TargetContext {
    pub supported_major: u64,
    pub options: ImportOptions,
    /// The academy currently owning the incoming slug, if any.
    pub slug_owner: Option<AcademyRef>,
    /// The academy named by `options.target_academy_id`, if it exists.
    pub target: Option<AcademyRef>,
    pub target_settings: Option<AcademySettings>,
    pub existing: ExistingContent,
}

impl TargetContext {
    /// A context describing an empty store.
    #[must_use]
    pub fn empty(options: ImportOptions) -> Self {
        Self {
            supported_major: format::SUPPORTED_MAJOR,
            options,
            slug_owner: None,
            target: None,
            target_settings: None,
            existing: ExistingContent::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Classify every conflict between `doc` and the snapshot in `ctx`.
#[must_use]
pub fn detect_conflicts(doc: &ExportDocument, ctx: &TargetContext) -> ConflictReport {
    let mut report = ConflictReport::default();
    check_format_version(doc, ctx, &mut report);
    check_target(ctx, &mut report);
    check_academy_slug(doc, ctx, &mut report);
    check_settings(doc, ctx, &mut report);
    check_references(doc, &mut report);
    check_duplicates(doc, &ctx.options, &mut report);
    if ctx.target.is_some() {
        check_content(&doc.courses, &[], ctx, &mut report);
    }
    report
}

fn check_format_version(doc: &ExportDocument, ctx: &TargetContext, report: &mut ConflictReport) {
    let found = doc.export_metadata.format_version.clone();
    let compatible = found
        .as_deref()
        .is_some_and(|v| format::is_compatible(v, ctx.supported_major));
    if !compatible {
        report.push(Conflict::new(
            ConflictKind::UnsupportedFormatVersion {
                found,
                supported_major: ctx.supported_major,
            },
            Severity::Critical,
            None,
        ));
    }
}

fn check_target(ctx: &TargetContext, report: &mut ConflictReport) {
    if let (Some(academy_id), None) = (&ctx.options.target_academy_id, &ctx.target) {
        report.push(Conflict::new(
            ConflictKind::TargetAcademyMissing {
                academy_id: academy_id.clone(),
            },
            Severity::Critical,
            None,
        ));
    }
}

fn check_academy_slug(doc: &ExportDocument, ctx: &TargetContext, report: &mut ConflictReport) {
    let (Some(slug), Some(owner)) = (doc.academy.slug.as_deref(), &ctx.slug_owner) else {
        return;
    };
    if ctx.target.as_ref().is_some_and(|t| t.id == owner.id) {
        return;
    }
    let resolution = if ctx.options.target_academy_id.is_some() {
        ctx.target.as_ref().map(|_| Resolution::KeepTargetSlug)
    } else if ctx.options.modify_slugs_on_conflict {
        Some(Resolution::Rename)
    } else {
        None
    };
    report.push(Conflict::new(
        ConflictKind::AcademySlugConflict {
            slug: slug.to_string(),
            existing_id: owner.id.clone(),
        },
        Severity::Critical,
        resolution,
    ));
}

fn check_settings(doc: &ExportDocument, ctx: &TargetContext, report: &mut ConflictReport) {
    let (Some(target), Some(stored), Some(incoming)) =
        (&ctx.target, &ctx.target_settings, &doc.settings)
    else {
        return;
    };
    if !settings_differ(stored, incoming) {
        return;
    }
    let resolution = if ctx.options.overwrite_existing {
        Resolution::Overwrite
    } else {
        Resolution::KeepExisting
    };
    report.push(Conflict::new(
        ConflictKind::SettingsConflict {
            academy_id: target.id.clone(),
        },
        Severity::Warning,
        Some(resolution),
    ));
}

/// Whether two settings records differ once serialized canonically.
#[must_use]
pub fn settings_differ(a: &AcademySettings, b: &AcademySettings) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => canonical_json(&a) != canonical_json(&b),
        _ => true,
    }
}

fn check_references(doc: &ExportDocument, report: &mut ConflictReport) {
    let mut course_ids = HashSet::new();
    let mut module_ids = HashSet::new();
    let mut lesson_ids = HashSet::new();
    for course in &doc.courses {
        course_ids.extend(course.id.as_ref().map(ToString::to_string));
        for module in &course.modules {
            module_ids.extend(module.id.as_ref().map(ToString::to_string));
            for lesson in &module.lessons {
                lesson_ids.extend(lesson.id.as_ref().map(ToString::to_string));
            }
        }
    }

    for (ci, course) in doc.courses.iter().enumerate() {
        let course_id = course.id.as_ref().map(ToString::to_string);
        for (mi, module) in course.modules.iter().enumerate() {
            let module_path = format!("courses[{ci}].modules[{mi}]");
            check_parent_ref(module, &module_path, course_id.as_deref(), &course_ids, report);
            let module_id = module.id.as_ref().map(ToString::to_string);
            for (li, lesson) in module.lessons.iter().enumerate() {
                let lesson_path = format!("{module_path}.lessons[{li}]");
                check_parent_ref(lesson, &lesson_path, module_id.as_deref(), &module_ids, report);
                let lesson_id = lesson.id.as_ref().map(ToString::to_string);
                for (qi, quiz) in lesson.quizzes.iter().enumerate() {
                    let quiz_path = format!("{lesson_path}.quizzes[{qi}]");
                    check_parent_ref(quiz, &quiz_path, lesson_id.as_deref(), &lesson_ids, report);
                }
            }
        }
    }
}

/// An item's parent reference must name an item of the document and, when
/// the enclosing parent carries an id, that parent.
fn check_parent_ref<T: ContentItem>(
    item: &T,
    path: &str,
    parent_id: Option<&str>,
    known: &HashSet<String>,
    report: &mut ConflictReport,
) {
    let Some(reference) = item.parent_ref().map(ToString::to_string) else {
        return;
    };
    let kind = match parent_id {
        _ if !known.contains(&reference) => ConflictKind::DanglingReference {
            level: T::LEVEL,
            path: path.to_string(),
            reference,
        },
        Some(parent) if parent != reference => ConflictKind::MisplacedReference {
            level: T::LEVEL,
            path: path.to_string(),
            reference,
            parent_id: parent.to_string(),
        },
        _ => return,
    };
    report.push(Conflict::new(kind, Severity::Critical, None));
}

fn check_duplicates(doc: &ExportDocument, options: &ImportOptions, report: &mut ConflictReport) {
    duplicates_among(&doc.courses, "courses", options, report);
    for (ci, course) in doc.courses.iter().enumerate() {
        let course_path = format!("courses[{ci}].modules");
        duplicates_among(&course.modules, &course_path, options, report);
        for (mi, module) in course.modules.iter().enumerate() {
            let module_path = format!("courses[{ci}].modules[{mi}].lessons");
            duplicates_among(&module.lessons, &module_path, options, report);
            for (li, lesson) in module.lessons.iter().enumerate() {
                let lesson_path = format!("{module_path}[{li}].quizzes");
                duplicates_among(&lesson.quizzes, &lesson_path, options, report);
            }
        }
    }
}

fn duplicates_among<T: ContentItem>(
    siblings: &[T],
    path: &str,
    options: &ImportOptions,
    report: &mut ConflictReport,
) {
    let mut seen: HashMap<&str, &T> = HashMap::new();
    for (i, item) in siblings.iter().enumerate() {
        let Some(slug) = item.match_key() else { continue };
        if let Some(first) = seen.get(slug) {
            let kind = ConflictKind::DuplicateSlug {
                level: T::LEVEL,
                slug: slug.to_string(),
                path: format!("{path}[{i}]"),
            };
            // Repeated questions are each imported as their own quiz.
            if T::LEVEL == ContentLevel::Quiz {
                report.push(Conflict::new(kind, Severity::Warning, None));
                continue;
            }
            let differs = fingerprints_differ(*first, item);
            report.push(Conflict::new(
                kind,
                Severity::Critical,
                options.collision_resolution(differs),
            ));
        } else {
            seen.insert(slug, item);
        }
    }
}

fn fingerprints_differ<A: ContentItem, B: ContentItem>(a: &A, b: &B) -> bool {
    match (a.fingerprint(), b.fingerprint()) {
        (Ok(a), Ok(b)) => a != b,
        _ => true,
    }
}

/// Whether `item` carries different content than the persisted `existing`.
#[must_use]
pub fn differs_from<T: ContentItem>(item: &T, existing: &ExistingItem) -> bool {
    !matches!(item.fingerprint(), Ok(hash) if hash == existing.content_hash)
}

/// Children of a content item, visited by `check_content`.
trait Children {
    fn visit(&self, parent: &[String], ctx: &TargetContext, report: &mut ConflictReport);
}

impl Children for Course {
    fn visit(&self, parent: &[String], ctx: &TargetContext, report: &mut ConflictReport) {
        check_content(&self.modules, parent, ctx, report);
    }
}

impl Children for Module {
    fn visit(&self, parent: &[String], ctx: &TargetContext, report: &mut ConflictReport) {
        check_content(&self.lessons, parent, ctx, report);
    }
}

impl Children for Lesson {
    fn visit(&self, parent: &[String], ctx: &TargetContext, report: &mut ConflictReport) {
        check_content(&self.quizzes, parent, ctx, report);
    }
}

impl Children for Quiz {
    fn visit(&self, _: &[String], _: &TargetContext, _: &mut ConflictReport) {}
}

fn check_content<T: ContentItem + Children>(
    items: &[T],
    parent: &[String],
    ctx: &TargetContext,
    report: &mut ConflictReport,
) {
    let mut keys = SiblingKeys::default();
    for item in items {
        let Some(key) = item.match_key() else { continue };
        let mut path = parent.to_vec();
        path.push(keys.segment(key));
        let Some(existing) = ctx.existing.get(&path) else {
            continue;
        };

        let differs = differs_from(item, existing);
        let resolution = ctx.options.collision_resolution(differs);
        let severity = if resolution.is_some() {
            Severity::Warning
        } else {
            Severity::Critical
        };
        report.push(Conflict::new(
            ConflictKind::content(T::LEVEL, path.join("/"), key.to_string(), existing.id.clone(), differs),
            severity,
            resolution,
        ));

        // Children are only compared when they will land under the existing item.
        if matches!(resolution, Some(Resolution::Overwrite | Resolution::KeepExisting)) {
            item.visit(&path, ctx, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Academy;
    use crate::ids::SourceId;
    use pretty_assertions::assert_eq;

    fn doc() -> ExportDocument {
        let mut doc = ExportDocument {
            academy: Academy {
                name: Some("Academy".into()),
                slug: Some("academy".into()),
                ..Academy::default()
            },
            courses: vec![Course {
                id: Some(SourceId::Number(1)),
                title: Some("Rust".into()),
                slug: Some("rust".into()),
                modules: vec![Module {
                    id: Some(SourceId::Number(10)),
                    course_id: Some(SourceId::Number(1)),
                    title: Some("Ownership".into()),
                    slug: Some("ownership".into()),
                    ..Module::default()
                }],
                ..Course::default()
            }],
            ..ExportDocument::default()
        };
        doc.seal().unwrap();
        doc
    }

    fn academy_ref(id: &str, slug: &str) -> AcademyRef {
        AcademyRef {
            id: id.into(),
            slug: slug.into(),
            name: "Existing".into(),
        }
    }

    #[test]
    fn empty_store_has_no_conflicts() {
        let report = detect_conflicts(&doc(), &TargetContext::empty(ImportOptions::default()));
        assert_eq!(report, ConflictReport::default());
        assert!(report.can_import());
    }

    #[test]
    fn foreign_slug_owner_is_one_critical_conflict() {
        let mut ctx = TargetContext::empty(ImportOptions::default());
        ctx.slug_owner = Some(academy_ref("aca-1", "academy"));
        let report = detect_conflicts(&doc(), &ctx);

        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.critical[0].code(), "academy_slug_conflict");
        assert_eq!(report.critical[0].resolution, Some(Resolution::Rename));
        assert!(!report.can_import());
        assert!(report.unresolved_critical().is_empty());
    }

    #[test]
    fn slug_conflict_without_rename_is_unresolved() {
        let options = ImportOptions {
            modify_slugs_on_conflict: false,
            ..ImportOptions::default()
        };
        let mut ctx = TargetContext::empty(options);
        ctx.slug_owner = Some(academy_ref("aca-1", "academy"));
        let report = detect_conflicts(&doc(), &ctx);
        assert_eq!(report.unresolved_critical().len(), 1);
    }

    #[test]
    fn target_owning_the_slug_is_not_a_conflict() {
        let options = ImportOptions {
            target_academy_id: Some("aca-1".into()),
            ..ImportOptions::default()
        };
        let mut ctx = TargetContext::empty(options);
        ctx.slug_owner = Some(academy_ref("aca-1", "academy"));
        ctx.target = Some(academy_ref("aca-1", "academy"));
        assert!(detect_conflicts(&doc(), &ctx).can_import());
    }

    #[test]
    fn missing_target_is_critical() {
        let options = ImportOptions {
            target_academy_id: Some("aca-404".into()),
            ..ImportOptions::default()
        };
        let report = detect_conflicts(&doc(), &TargetContext::empty(options));
        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.critical[0].code(), "target_academy_missing");
    }

    #[test]
    fn unsupported_major_is_critical() {
        let mut doc = doc();
        doc.export_metadata.format_version = Some("1.4.0".into());
        let report = detect_conflicts(&doc, &TargetContext::empty(ImportOptions::default()));
        assert_eq!(
            report.critical[0].kind,
            ConflictKind::UnsupportedFormatVersion {
                found: Some("1.4.0".into()),
                supported_major: 2,
            }
        );
    }

    #[test]
    fn dangling_quiz_reference_is_critical() {
        let mut doc = doc();
        doc.courses[0].modules[0].lessons.push(Lesson {
            id: Some(SourceId::Number(100)),
            module_id: Some(SourceId::Number(10)),
            title: Some("Borrowing".into()),
            slug: Some("borrowing".into()),
            quizzes: vec![Quiz {
                lesson_id: Some(SourceId::Number(999)),
                question: Some("?".into()),
                ..Quiz::default()
            }],
            ..Lesson::default()
        });
        let report = detect_conflicts(&doc, &TargetContext::empty(ImportOptions::default()));
        assert_eq!(report.critical.len(), 1);
        assert_eq!(
            report.critical[0].kind,
            ConflictKind::DanglingReference {
                level: ContentLevel::Quiz,
                path: "courses[0].modules[0].lessons[0].quizzes[0]".into(),
                reference: "999".into(),
            }
        );
    }

    #[test]
    fn reference_to_another_course_is_misplaced() {
        let mut doc = doc();
        doc.courses.push(Course {
            id: Some(SourceId::Number(2)),
            title: Some("Go".into()),
            slug: Some("go".into()),
            ..Course::default()
        });
        doc.courses[0].modules[0].course_id = Some(SourceId::Number(2));
        let report = detect_conflicts(&doc, &TargetContext::empty(ImportOptions::default()));
        assert_eq!(report.critical.len(), 1);
        assert_eq!(
            report.critical[0].kind,
            ConflictKind::MisplacedReference {
                level: ContentLevel::Module,
                path: "courses[0].modules[0]".into(),
                reference: "2".into(),
                parent_id: "1".into(),
            }
        );
        assert_eq!(report.critical[0].resolution, None);
    }

    #[test]
    fn repeated_quiz_questions_only_warn() {
        let mut doc = doc();
        let quiz = |answer: &str| Quiz {
            question: Some("True or false?".into()),
            correct_answer: Some(serde_json::json!(answer)),
            ..Quiz::default()
        };
        doc.courses[0].modules[0].lessons.push(Lesson {
            title: Some("Borrowing".into()),
            slug: Some("borrowing".into()),
            quizzes: vec![quiz("true"), quiz("false")],
            ..Lesson::default()
        });
        let options = ImportOptions {
            modify_slugs_on_conflict: false,
            ..ImportOptions::default()
        };
        let report = detect_conflicts(&doc, &TargetContext::empty(options));
        assert!(report.critical.is_empty(), "{:?}", report.critical);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code(), "duplicate_slug");
        assert!(report.warnings[0].message.starts_with("quiz question 'True or false?'"));
    }

    #[test]
    fn repeated_stored_questions_pair_in_order() {
        let mut doc = doc();
        let quiz = |answer: &str| Quiz {
            question: Some("Q".into()),
            correct_answer: Some(serde_json::json!(answer)),
            ..Quiz::default()
        };
        doc.courses[0].modules[0].lessons.push(Lesson {
            title: Some("L".into()),
            slug: Some("l".into()),
            quizzes: vec![quiz("a"), quiz("b")],
            ..Lesson::default()
        });
        let options = ImportOptions {
            target_academy_id: Some("aca-1".into()),
            modify_slugs_on_conflict: false,
            ..ImportOptions::default()
        };
        let mut ctx = TargetContext::empty(options);
        ctx.target = Some(academy_ref("aca-1", "academy"));

        let course = &doc.courses[0];
        let module = &course.modules[0];
        let lesson = &module.lessons[0];
        let stored: [(&[&str], &str, String); 5] = [
            (&["rust"], "crs-1", course.fingerprint().unwrap()),
            (&["rust", "ownership"], "mod-1", module.fingerprint().unwrap()),
            (&["rust", "ownership", "l"], "les-1", lesson.fingerprint().unwrap()),
            (&["rust", "ownership", "l", "Q"], "qz-1", lesson.quizzes[0].fingerprint().unwrap()),
            (&["rust", "ownership", "l", "Q#2"], "qz-2", lesson.quizzes[1].fingerprint().unwrap()),
        ];
        for (path, id, content_hash) in stored {
            ctx.existing.insert(
                path.iter().map(|s| (*s).to_string()).collect(),
                ExistingItem {
                    id: id.into(),
                    content_hash,
                },
            );
        }

        let report = detect_conflicts(&doc, &ctx);
        assert!(report.critical.is_empty(), "{:?}", report.critical);
        let quiz_matches: Vec<_> = report
            .warnings
            .iter()
            .filter_map(|c| match &c.kind {
                ConflictKind::QuizConflict {
                    existing_id,
                    differs,
                    ..
                } => Some((existing_id.as_str(), *differs)),
                _ => None,
            })
            .collect();
        assert_eq!(quiz_matches, vec![("qz-1", false), ("qz-2", false)]);
        assert_eq!(sibling_key("Q", 1), "Q#2");
    }

    #[test]
    fn sibling_duplicates_are_flagged() {
        let mut doc = doc();
        let copy = doc.courses[0].clone();
        doc.courses.push(copy);
        let report = detect_conflicts(&doc, &TargetContext::empty(ImportOptions::default()));
        let dup: Vec<_> = report
            .critical
            .iter()
            .filter(|c| c.code() == "duplicate_slug")
            .collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].resolution, Some(Resolution::Rename));
    }

    fn target_with_course(hash: String) -> TargetContext {
        let options = ImportOptions {
            target_academy_id: Some("aca-1".into()),
            modify_slugs_on_conflict: false,
            ..ImportOptions::default()
        };
        let mut ctx = TargetContext::empty(options);
        ctx.target = Some(academy_ref("aca-1", "other"));
        ctx.existing.insert(
            vec!["rust".into()],
            ExistingItem {
                id: "crs-1".into(),
                content_hash: hash,
            },
        );
        ctx
    }

    #[test]
    fn differing_course_without_policy_is_critical() {
        let ctx = target_with_course("stale".into());
        let report = detect_conflicts(&doc(), &ctx);
        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.critical[0].code(), "course_slug_conflict");
        assert_eq!(report.critical[0].resolution, None);
    }

    #[test]
    fn identical_course_is_reused_and_children_compared() {
        let doc = doc();
        let mut ctx = target_with_course(doc.courses[0].fingerprint().unwrap());
        ctx.existing.insert(
            vec!["rust".into(), "ownership".into()],
            ExistingItem {
                id: "mod-1".into(),
                content_hash: "stale".into(),
            },
        );
        let report = detect_conflicts(&doc, &ctx);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].resolution, Some(Resolution::KeepExisting));
        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.critical[0].code(), "module_slug_conflict");
    }

    #[test]
    fn overwrite_turns_content_conflicts_into_warnings() {
        let mut ctx = target_with_course("stale".into());
        ctx.options.overwrite_existing = true;
        let report = detect_conflicts(&doc(), &ctx);
        assert!(report.can_import());
        assert_eq!(report.warnings[0].resolution, Some(Resolution::Overwrite));
    }

    #[test]
    fn changed_settings_warn() {
        let mut doc = doc();
        doc.settings = Some(AcademySettings {
            tenant_mode: Some("dedicated".into()),
            ..AcademySettings::default()
        });
        let mut ctx = target_with_course("unused".into());
        ctx.existing = ExistingContent::default();
        ctx.target_settings = Some(AcademySettings::default());
        let report = detect_conflicts(&doc, &ctx);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code(), "settings_conflict");
        assert_eq!(report.warnings[0].resolution, Some(Resolution::KeepExisting));
    }

    #[test]
    fn conflicts_serialize_with_type_tag() {
        let conflict = Conflict::new(
            ConflictKind::AcademySlugConflict {
                slug: "a".into(),
                existing_id: "aca-1".into(),
            },
            Severity::Critical,
            None,
        );
        let value = serde_json::to_value(&conflict).unwrap();
        assert_eq!(value["type"], "academy_slug_conflict");
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["existing_id"], "aca-1");
    }
}
