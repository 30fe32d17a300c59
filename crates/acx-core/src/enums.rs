//! Content levels, conflict classifications, and packaging enums.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{PREFIX_COURSE, PREFIX_LESSON, PREFIX_MODULE, PREFIX_QUIZ};

// ---------------------------------------------------------------------------
// ContentLevel
// ---------------------------------------------------------------------------

/// One level of the academy content tree.
///
/// ```text
/// academy → course → module → lesson → quiz
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentLevel {
    Course,
    Module,
    Lesson,
    Quiz,
}

impl ContentLevel {
    pub const ALL: [Self; 4] = [Self::Course, Self::Module, Self::Lesson, Self::Quiz];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Module => "module",
            Self::Lesson => "lesson",
            Self::Quiz => "quiz",
        }
    }

    /// SQL table holding rows of this level.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Course => "courses",
            Self::Module => "modules",
            Self::Lesson => "lessons",
            Self::Quiz => "quizzes",
        }
    }

    /// Foreign-key column pointing at the parent row.
    #[must_use]
    pub const fn parent_column(self) -> &'static str {
        match self {
            Self::Course => "academy_id",
            Self::Module => "course_id",
            Self::Lesson => "module_id",
            Self::Quiz => "lesson_id",
        }
    }

    /// Column used to match an incoming item against persisted siblings.
    ///
    /// Quizzes have no slug; they are matched by question text.
    #[must_use]
    pub const fn key_column(self) -> &'static str {
        match self {
            Self::Quiz => "title",
            Self::Course | Self::Module | Self::Lesson => "slug",
        }
    }

    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Course => PREFIX_COURSE,
            Self::Module => PREFIX_MODULE,
            Self::Lesson => PREFIX_LESSON,
            Self::Quiz => PREFIX_QUIZ,
        }
    }

    /// JSON key of the parent reference inside an exported item.
    #[must_use]
    pub const fn parent_ref_key(self) -> Option<&'static str> {
        match self {
            Self::Course => None,
            Self::Module => Some("courseId"),
            Self::Lesson => Some("moduleId"),
            Self::Quiz => Some("lessonId"),
        }
    }

    /// JSON key of the child array inside an exported item.
    #[must_use]
    pub const fn children_key(self) -> Option<&'static str> {
        match self {
            Self::Course => Some("modules"),
            Self::Module => Some("lessons"),
            Self::Lesson => Some("quizzes"),
            Self::Quiz => None,
        }
    }

    /// Name of the human-readable identity field.
    #[must_use]
    pub const fn title_field(self) -> &'static str {
        match self {
            Self::Quiz => "question",
            Self::Course | Self::Module | Self::Lesson => "title",
        }
    }
}

impl fmt::Display for ContentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Whether a conflict blocks an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How the import policy will settle a detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Create the incoming item under a suffixed slug.
    Rename,
    /// Update the existing item in place.
    Overwrite,
    /// Leave the existing item untouched and drop the incoming subtree.
    Skip,
    /// Reuse the existing, materially identical item.
    KeepExisting,
    /// Import into the requested target academy without touching its slug.
    KeepTargetSlug,
}

impl Resolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
            Self::KeepExisting => "keep_existing",
            Self::KeepTargetSlug => "keep_target_slug",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Packaging
// ---------------------------------------------------------------------------

/// Archive container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PackageFormat {
    #[default]
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "zip")]
    Zip,
}

impl PackageFormat {
    pub const ALL: [Self; 2] = [Self::TarGz, Self::Zip];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// File extension (without the leading dot) used for archives.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }

    /// Format named by a file name's extension, if any.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::split_file_name(name).map(|(_, format)| format)
    }

    /// Split `<stem>.<ext>` into the stem and its format.
    #[must_use]
    pub fn split_file_name(name: &str) -> Option<(&str, Self)> {
        Self::ALL.into_iter().find_map(|format| {
            name.strip_suffix(format.extension())
                .and_then(|rest| rest.strip_suffix('.'))
                .map(|stem| (stem, format))
        })
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            other => Err(format!("unsupported package format '{other}'")),
        }
    }
}

/// Gzip compression level preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Low,
    #[default]
    Default,
    High,
}

impl Compression {
    #[must_use]
    pub const fn level(self) -> u32 {
        match self {
            Self::Low => 3,
            Self::Default => 6,
            Self::High => 9,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Default => "default",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "default" => Ok(Self::Default),
            "high" => Ok(Self::High),
            other => Err(format!("unknown compression level '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_level_serializes_snake_case() {
        let json = serde_json::to_string(&ContentLevel::Lesson).unwrap();
        assert_eq!(json, "\"lesson\"");
    }

    #[test]
    fn every_level_has_distinct_table_and_prefix() {
        let tables: std::collections::HashSet<_> =
            ContentLevel::ALL.iter().map(|l| l.table()).collect();
        let prefixes: std::collections::HashSet<_> =
            ContentLevel::ALL.iter().map(|l| l.id_prefix()).collect();
        assert_eq!(tables.len(), 4);
        assert_eq!(prefixes.len(), 4);
    }

    #[test]
    fn package_format_serializes_with_dot() {
        assert_eq!(
            serde_json::to_string(&PackageFormat::TarGz).unwrap(),
            "\"tar.gz\""
        );
        assert_eq!("zip".parse::<PackageFormat>().unwrap(), PackageFormat::Zip);
        assert!("rar".parse::<PackageFormat>().is_err());
    }

    #[test]
    fn package_format_from_file_name() {
        assert_eq!(
            PackageFormat::split_file_name("bio-1.tar.gz"),
            Some(("bio-1", PackageFormat::TarGz))
        );
        assert_eq!(
            PackageFormat::split_file_name("bio-1.zip"),
            Some(("bio-1", PackageFormat::Zip))
        );
        assert_eq!(PackageFormat::from_file_name("bio-1.json"), None);
        assert_eq!(PackageFormat::from_file_name("bio-1.gz"), None);
    }

    #[test]
    fn compression_levels() {
        assert_eq!(Compression::Low.level(), 3);
        assert_eq!(Compression::Default.level(), 6);
        assert_eq!(Compression::High.level(), 9);
        assert_eq!("high".parse::<Compression>().unwrap(), Compression::High);
    }
}
