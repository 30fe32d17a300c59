//! Serde roundtrip and JsonSchema validation tests for the exchange types.

use acx_core::entities::*;
use acx_core::enums::*;
use acx_core::ids::SourceId;
use acx_core::responses::*;
use acx_core::validation::validate;
use chrono::Utc;
use pretty_assertions::assert_eq;
use schemars::schema_for;
use serde_json::json;

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(recovered, val, "serde roundtrip failed for {}", stringify!($ty));

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

/// A document shaped the way the producing platform writes it.
const PRODUCER_DOCUMENT: &str = r##"{
  "academy": {
    "id": 42,
    "name": "Field Robotics",
    "slug": "field-robotics",
    "description": "Sensors, actuators, and autonomy",
    "version": "3",
    "theme": {"primary": "#0a5"},
    "isPublished": true,
    "workflowState": "published",
    "customDomain": "robotics.example.org"
  },
  "settings": {
    "tenantMode": "dedicated",
    "maxUsers": 250,
    "maxStorageGb": 12.5,
    "featuresEnabled": {"forums": true}
  },
  "courses": [
    {
      "id": 1,
      "title": "Kinematics",
      "slug": "kinematics",
      "order": 1,
      "workflowState": "review",
      "modules": [
        {
          "id": "m-1",
          "courseId": 1,
          "title": "Frames",
          "slug": "frames",
          "lessons": [
            {
              "id": 7,
              "moduleId": "m-1",
              "title": "Rotation matrices",
              "slug": "rotation-matrices",
              "content": {"blocks": [{"type": "text", "body": "R^T R = I"}]},
              "estimatedMinutes": 20,
              "quizzes": [
                {
                  "lessonId": 7,
                  "question": "What is the determinant of a rotation matrix?",
                  "questionType": "single_choice",
                  "choices": ["0", "1", "-1"],
                  "correctAnswer": "1"
                }
              ]
            }
          ]
        }
      ]
    }
  ],
  "exportMetadata": {
    "exportedAt": "2026-03-01T12:00:00Z",
    "exportedBy": {"userId": 9, "userEmail": "ops@example.org"},
    "formatVersion": "2.0.0"
  }
}"##;

#[test]
fn producer_document_parses_and_keeps_unknown_fields() {
    let doc = ExportDocument::from_json(PRODUCER_DOCUMENT).unwrap();
    assert_eq!(doc.academy.id, Some(SourceId::Number(42)));
    assert_eq!(
        doc.academy.extra.get("customDomain"),
        Some(&json!("robotics.example.org"))
    );
    let lesson = &doc.courses[0].modules[0].lessons[0];
    assert_eq!(lesson.module_id, Some(SourceId::Text("m-1".into())));
    assert_eq!(lesson.extra.get("estimatedMinutes"), Some(&json!(20)));
    assert_eq!(
        doc.content_counts(),
        ContentCounts {
            courses: 1,
            modules: 1,
            lessons: 1,
            quizzes: 1
        }
    );

    let back = serde_json::to_value(&doc).unwrap();
    assert_eq!(back["courses"][0]["modules"][0]["lessons"][0]["estimatedMinutes"], 20);
    assert_eq!(back["settings"]["maxStorageGb"], 12.5);
}

#[test]
fn sealing_a_producer_document_makes_it_valid() {
    let mut doc = ExportDocument::from_json(PRODUCER_DOCUMENT).unwrap();
    assert!(!validate(&doc).valid);
    doc.seal().unwrap();
    assert!(validate(&doc).valid);

    let reparsed = ExportDocument::from_json(&serde_json::to_string(&doc).unwrap()).unwrap();
    assert!(validate(&reparsed).valid, "checksum must survive a text round trip");
}

#[test]
fn checksum_ignores_key_order_in_input() {
    let mut doc = ExportDocument::from_json(PRODUCER_DOCUMENT).unwrap();
    doc.seal().unwrap();

    let mut value = serde_json::to_value(&doc).unwrap();
    let academy = value["academy"].as_object().unwrap().clone();
    let reversed: serde_json::Map<_, _> = academy.into_iter().rev().collect();
    value["academy"] = serde_json::Value::Object(reversed);

    let reordered: ExportDocument = serde_json::from_value(value).unwrap();
    assert_eq!(reordered.compute_checksum().unwrap(), doc.compute_checksum().unwrap());
}

roundtrip_and_validate!(
    export_document_roundtrip,
    ExportDocument,
    {
        let mut doc = ExportDocument::from_json(PRODUCER_DOCUMENT).unwrap();
        doc.export_metadata.exported_at = Some(Utc::now());
        doc
    }
);

roundtrip_and_validate!(
    academy_summary_roundtrip,
    AcademySummary,
    AcademySummary {
        id: Some(SourceId::Text("aca-1a2b3c4d".into())),
        name: "Field Robotics".into(),
        slug: "field-robotics".into(),
        version: Some("3".into()),
        description: None,
    }
);

roundtrip_and_validate!(
    import_options_roundtrip,
    ImportOptions,
    ImportOptions {
        overwrite_existing: true,
        modify_slugs_on_conflict: false,
        skip_conflicting_content: false,
        target_academy_id: Some("aca-1a2b3c4d".into()),
    }
);

roundtrip_and_validate!(
    import_result_roundtrip,
    ImportResult,
    ImportResult {
        academy_id: "aca-1a2b3c4d".into(),
        academy: AcademySnapshot {
            id: "aca-1a2b3c4d".into(),
            name: "Field Robotics".into(),
            slug: "field-robotics-2".into(),
            version: Some("3".into()),
            workflow_state: Some("published".into()),
        },
        stats: ImportStats {
            created: 4,
            updated: 0,
            skipped: 0,
        },
        warnings: vec![
            ImportWarning::AcademySlugModified {
                original: "field-robotics".into(),
                resolved: "field-robotics-2".into(),
            },
            ImportWarning::ContentSkipped {
                level: ContentLevel::Module,
                path: "kinematics/frames".into(),
                items: 3,
            },
        ],
    }
);

roundtrip_and_validate!(
    content_record_roundtrip,
    ContentRecord,
    ContentRecord {
        id: "les-0f1e2d3c".into(),
        level: ContentLevel::Lesson,
        parent_id: "mod-9a8b7c6d".into(),
        academy_id: "aca-1a2b3c4d".into(),
        slug: Some("rotation-matrices".into()),
        title: "Rotation matrices".into(),
        position: 0,
        is_published: false,
        workflow_state: Some("draft".into()),
        content_hash: "ab".repeat(32),
        body: json!({"title": "Rotation matrices", "slug": "rotation-matrices"}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

#[test]
fn schema_rejects_unknown_resolution() {
    let schema = serde_json::to_value(schema_for!(Resolution)).unwrap();
    let errors = validate_against_schema(&schema, &json!("merge"));
    assert!(!errors.is_empty());
}
