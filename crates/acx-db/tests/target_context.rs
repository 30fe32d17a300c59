//! Store snapshots feeding conflict detection.

use acx_core::conflict::detect_conflicts;
use acx_core::entities::{Academy, AcademySettings, ContentItem, Course, ExportDocument, Module};
use acx_core::enums::Resolution;
use acx_core::responses::ImportOptions;
use acx_db::repos::content::ContentDraft;
use acx_db::service::AcademyStore;
use pretty_assertions::assert_eq;

fn course() -> Course {
    Course {
        title: Some("Genetics".into()),
        slug: Some("genetics".into()),
        modules: vec![Module {
            title: Some("Alleles".into()),
            slug: Some("alleles".into()),
            ..Module::default()
        }],
        ..Course::default()
    }
}

fn document() -> ExportDocument {
    let mut doc = ExportDocument {
        academy: Academy {
            name: Some("Biology".into()),
            slug: Some("biology".into()),
            ..Academy::default()
        },
        settings: Some(AcademySettings {
            max_users: Some(100),
            ..AcademySettings::default()
        }),
        courses: vec![course()],
        ..ExportDocument::default()
    };
    doc.seal().unwrap();
    doc
}

async fn seeded() -> (AcademyStore, String) {
    let store = AcademyStore::open_local(":memory:").await.unwrap();
    let uow = store.begin().await.unwrap();
    let academy = Academy {
        name: Some("Biology".into()),
        ..Academy::default()
    };
    let academy_id = uow.insert_academy(&academy, "biology").await.unwrap().id;
    let course = course();
    let course_id = uow
        .insert_content(
            &ContentDraft::from_item(&course, None, 0).unwrap(),
            &academy_id,
            &academy_id,
        )
        .await
        .unwrap();
    uow.insert_content(
        &ContentDraft::from_item(&course.modules[0], None, 0).unwrap(),
        &course_id,
        &academy_id,
    )
    .await
    .unwrap();
    uow.commit().await.unwrap();
    (store, academy_id)
}

#[tokio::test]
async fn slug_owner_is_found_without_target() {
    let (store, academy_id) = seeded().await;
    let ctx = store
        .target_context(&document(), &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(ctx.slug_owner.map(|o| o.id), Some(academy_id));
    assert!(ctx.target.is_none());
    assert!(ctx.existing.is_empty());
}

#[tokio::test]
async fn target_snapshot_includes_content_paths() {
    let (store, academy_id) = seeded().await;
    let options = ImportOptions {
        target_academy_id: Some(academy_id.clone()),
        ..ImportOptions::default()
    };
    let ctx = store.target_context(&document(), &options).await.unwrap();

    assert_eq!(ctx.target.as_ref().map(|t| t.id.as_str()), Some(academy_id.as_str()));
    assert_eq!(ctx.existing.len(), 2);
    let stored = ctx
        .existing
        .get(&["genetics".to_string(), "alleles".to_string()])
        .unwrap();
    assert_eq!(stored.content_hash, course().modules[0].fingerprint().unwrap());
}

#[tokio::test]
async fn unchanged_content_is_reused_without_policy() {
    let (store, academy_id) = seeded().await;
    let options = ImportOptions {
        target_academy_id: Some(academy_id),
        modify_slugs_on_conflict: false,
        ..ImportOptions::default()
    };
    let ctx = store.target_context(&document(), &options).await.unwrap();
    let report = detect_conflicts(&document(), &ctx);

    assert!(report.can_import());
    let resolutions: Vec<_> = report.warnings.iter().map(|c| c.resolution).collect();
    assert_eq!(
        resolutions,
        vec![Some(Resolution::KeepExisting), Some(Resolution::KeepExisting)]
    );
}
