//! Canonical JSON and SHA-256 helpers.
//!
//! The document checksum must not depend on key order, map implementation, or
//! whitespace. `canonical_json` writes objects with keys sorted bytewise and
//! no insignificant whitespace, independent of whether `serde_json` was built
//! with `preserve_order`.

use std::fmt::Write as _;

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::entities::{Academy, AcademySettings, Course};
use crate::errors::CoreError;

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compact JSON text with object keys sorted at every depth.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Value's Display writes escaped, quoted JSON strings.
                let _ = write!(out, "{}", Value::String(key.clone()));
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

/// Checksum over `{academy, settings, courses}`; an absent settings section
/// hashes as `null`.
///
/// # Errors
///
/// Returns `CoreError::Serialization` if a section cannot be converted to JSON.
pub fn document_checksum(
    academy: &Academy,
    settings: Option<&AcademySettings>,
    courses: &[Course],
) -> Result<String, CoreError> {
    let covered = json!({
        "academy": serde_json::to_value(academy)?,
        "settings": serde_json::to_value(settings)?,
        "courses": serde_json::to_value(courses)?,
    });
    Ok(sha256_hex(canonical_json(&covered).as_bytes()))
}
