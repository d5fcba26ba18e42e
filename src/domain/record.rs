//! Content records stored in the shared collection.
//!
//! A record's `content` is opaque JSON here; only the schema registered for
//! its category gives it meaning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between the category id and the user-chosen label in a
/// canonical name.
pub const NAME_SEPARATOR: char = ':';

/// Build the store-unique name for a user-chosen label: `"<category>:<label>"`
pub fn canonical_name(category: &str, label: &str) -> String {
    format!("{}{}{}", category, NAME_SEPARATOR, label)
}

/// Store-assigned record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A persisted content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Store-assigned identifier
    pub id: RecordId,

    /// Category identifier (the discriminant)
    #[serde(rename = "type")]
    pub category: String,

    /// Canonical name (`"<type>:<label>"`), unique across the collection
    pub name: String,

    /// Category-specific payload
    pub content: Value,

    /// When the store created the record
    pub created_at: DateTime<Utc>,

    /// When the store last wrote the record
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// The user-chosen part of the canonical name
    pub fn label(&self) -> &str {
        self.name
            .split_once(NAME_SEPARATOR)
            .map(|(_, label)| label)
            .unwrap_or(&self.name)
    }
}

/// A validated record that has not been stored yet.
///
/// Only the validation engine constructs these, so anything handed to the
/// repository has already passed its category's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentRecord {
    category: String,
    name: String,
    content: Value,
}

impl NewContentRecord {
    pub(crate) fn new(category: String, name: String, content: Value) -> Self {
        Self {
            category,
            name,
            content,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Value {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("text", "welcome"), "text:welcome");
        assert_eq!(canonical_name("url", "docs"), "url:docs");
    }

    #[test]
    fn test_record_wire_format() {
        let now = Utc::now();
        let record = ContentRecord {
            id: RecordId::new("abc"),
            category: "text".to_string(),
            name: "text:welcome".to_string(),
            content: json!("hello"),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["type"], "text");
        assert_eq!(value["name"], "text:welcome");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());

        let parsed: ContentRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_label() {
        let now = Utc::now();
        let record = ContentRecord {
            id: RecordId::new("abc"),
            category: "url".to_string(),
            name: "url:docs".to_string(),
            content: json!("https://example.com"),
            created_at: now,
            updated_at: now,
        };

        assert_eq!(record.label(), "docs");
    }
}
