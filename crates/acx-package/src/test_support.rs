//! Shared fixtures for package tests.

use chrono::{TimeZone, Utc};
use serde_json::json;

use acx_core::entities::{
    Academy, AcademySettings, Course, ExportDocument, Lesson, Module, Quiz,
};
use acx_core::ids::SourceId;

/// A sealed one-course academy with a lesson body and a quiz.
pub fn sample_document() -> ExportDocument {
    let mut doc = ExportDocument {
        academy: Academy {
            name: Some("Marine Biology".into()),
            slug: Some("marine-biology".into()),
            description: Some("Life under the waves".into()),
            ..Academy::default()
        },
        settings: Some(AcademySettings {
            max_users: Some(250),
            ..AcademySettings::default()
        }),
        courses: vec![Course {
            id: Some(SourceId::Number(1)),
            title: Some("Reefs".into()),
            slug: Some("reefs".into()),
            modules: vec![Module {
                id: Some(SourceId::Number(10)),
                course_id: Some(SourceId::Number(1)),
                title: Some("Corals".into()),
                slug: Some("corals".into()),
                lessons: vec![Lesson {
                    id: Some(SourceId::Number(100)),
                    module_id: Some(SourceId::Number(10)),
                    title: Some("Polyps".into()),
                    slug: Some("polyps".into()),
                    content: Some(json!({"blocks": [{"type": "text", "body": "Polyps build reefs."}]})),
                    quizzes: vec![Quiz {
                        id: Some(SourceId::Number(1000)),
                        lesson_id: Some(SourceId::Number(100)),
                        question: Some("What builds a reef?".into()),
                        choices: Some(json!(["polyps", "sharks"])),
                        correct_answer: Some(json!(0)),
                        ..Quiz::default()
                    }],
                    ..Lesson::default()
                }],
                ..Module::default()
            }],
            ..Course::default()
        }],
        ..ExportDocument::default()
    };
    doc.export_metadata.exported_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single();
    doc.seal().expect("sample document seals");
    doc
}
