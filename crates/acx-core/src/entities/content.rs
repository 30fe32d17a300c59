use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum;
use crate::enums::ContentLevel;
use crate::errors::CoreError;
use crate::ids::SourceId;

/// A course: the top of an academy's content tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Producer-side ordering hint. Import follows array order, not this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    /// Must name a course id present in the same document when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Common view over the four content levels.
pub trait ContentItem: Serialize {
    const LEVEL: ContentLevel;

    fn source_id(&self) -> Option<&SourceId>;
    fn parent_ref(&self) -> Option<&SourceId>;
    fn title(&self) -> Option<&str>;
    fn slug(&self) -> Option<&str>;
    fn workflow_state(&self) -> Option<&str>;
    fn is_published(&self) -> bool;

    /// Value compared against persisted siblings: the slug, or the question
    /// text for quizzes.
    fn match_key(&self) -> Option<&str> {
        match Self::LEVEL {
            ContentLevel::Quiz => self.title(),
            _ => self.slug(),
        }
    }

    /// The item as persisted: its JSON form without source id, parent
    /// reference, or children.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the item cannot be converted to JSON.
    fn body(&self) -> Result<Value, CoreError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
            if let Some(key) = Self::LEVEL.parent_ref_key() {
                map.remove(key);
            }
            if let Some(key) = Self::LEVEL.children_key() {
                map.remove(key);
            }
        }
        Ok(value)
    }

    /// Digest of the body minus its slug. Two items with equal fingerprints
    /// carry the same content even if one of them was renamed on import.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the item cannot be converted to JSON.
    fn fingerprint(&self) -> Result<String, CoreError> {
        let mut body = self.body()?;
        if let Value::Object(map) = &mut body {
            map.remove("slug");
        }
        Ok(checksum::sha256_hex(checksum::canonical_json(&body).as_bytes()))
    }
}

macro_rules! impl_content_item {
    (@ref $self:ident, none) => {
        None
    };
    (@ref $self:ident, $field:ident) => {
        $self.$field.as_ref()
    };
    (@str $self:ident, none) => {
        None
    };
    (@str $self:ident, $field:ident) => {
        $self.$field.as_deref()
    };
    ($ty:ty, $level:ident, $parent:ident, $title:ident, $slug:ident) => {
        impl ContentItem for $ty {
            const LEVEL: ContentLevel = ContentLevel::$level;

            fn source_id(&self) -> Option<&SourceId> {
                self.id.as_ref()
            }

            fn parent_ref(&self) -> Option<&SourceId> {
                impl_content_item!(@ref self, $parent)
            }

            fn title(&self) -> Option<&str> {
                self.$title.as_deref()
            }

            fn slug(&self) -> Option<&str> {
                impl_content_item!(@str self, $slug)
            }

            fn workflow_state(&self) -> Option<&str> {
                self.workflow_state.as_deref()
            }

            fn is_published(&self) -> bool {
                self.is_published.unwrap_or(false)
            }
        }
    };
}

impl_content_item!(Course, Course, none, title, slug);
impl_content_item!(Module, Module, course_id, title, slug);
impl_content_item!(Lesson, Lesson, module_id, title, slug);
impl_content_item!(Quiz, Quiz, lesson_id, question, none);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_preserved() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": 3000,
            "title": "Intro",
            "slug": "intro",
            "estimatedMinutes": 15,
            "metadata": {"level": 1}
        }))
        .unwrap();
        assert_eq!(lesson.extra.get("estimatedMinutes"), Some(&json!(15)));
        let back = serde_json::to_value(&lesson).unwrap();
        assert_eq!(back["metadata"], json!({"level": 1}));
    }

    #[test]
    fn body_strips_identity_and_children() {
        let module = Module {
            id: Some(SourceId::Number(7)),
            course_id: Some(SourceId::Number(1)),
            title: Some("Basics".into()),
            slug: Some("basics".into()),
            lessons: vec![Lesson::default()],
            ..Module::default()
        };
        let body = module.body().unwrap();
        assert_eq!(body, json!({"title": "Basics", "slug": "basics"}));
    }

    #[test]
    fn fingerprint_ignores_slug_but_not_content() {
        let a = Course {
            title: Some("Rust".into()),
            slug: Some("rust".into()),
            ..Course::default()
        };
        let mut renamed = a.clone();
        renamed.slug = Some("rust-2".into());
        let mut edited = a.clone();
        edited.description = Some("changed".into());

        assert_eq!(a.fingerprint().unwrap(), renamed.fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), edited.fingerprint().unwrap());
    }

    #[test]
    fn quiz_matches_by_question() {
        let quiz = Quiz {
            question: Some("What is ownership?".into()),
            ..Quiz::default()
        };
        assert_eq!(quiz.match_key(), Some("What is ownership?"));
        assert_eq!(quiz.slug(), None);
    }
}
