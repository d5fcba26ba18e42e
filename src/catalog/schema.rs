//! Payload schemas for content categories.
//!
//! A schema confirms the shape of a candidate record. It never rewrites the
//! candidate: the record that gets stored carries exactly the content the
//! caller sent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::domain::record::NAME_SEPARATOR;

/// A single field-level schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field path within the candidate record (`type`, `name`, `content`)
    pub path: String,

    /// Why the field was rejected
    pub reason: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// A record assembled from untyped input, awaiting its schema check.
///
/// `name` and `content` stay untyped until the schema has looked at them.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Discriminant (the category the caller asked for)
    pub category: String,

    /// Canonical name, or the raw value when the caller's name was not a string
    pub name: Option<Value>,

    pub content: Option<Value>,
}

/// Validator for one category's payload shape
pub trait ContentSchema: Send + Sync {
    /// Short human-readable description of accepted content
    fn describe(&self) -> String;

    /// Check a candidate, reporting every violated field
    fn check(&self, candidate: &Candidate) -> Result<(), Vec<FieldViolation>>;
}

/// Built-in content shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentShape {
    /// Any string
    Text,

    /// A string that parses as an absolute URL
    Url,
}

impl ContentShape {
    /// Check a content value against this shape
    pub fn check(&self, content: &Value) -> Result<(), String> {
        let text = content
            .as_str()
            .ok_or_else(|| format!("expected string, found {}", value_kind(content)))?;

        match self {
            ContentShape::Text => Ok(()),
            ContentShape::Url => Url::parse(text)
                .map(|_| ())
                .map_err(|e| format!("not a valid absolute URL ({})", e)),
        }
    }
}

impl std::fmt::Display for ContentShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentShape::Text => write!(f, "text"),
            ContentShape::Url => write!(f, "url"),
        }
    }
}

/// Standard record schema: `{type: <literal>, name: "<type>:<label>", content: <shape>}`
#[derive(Debug, Clone)]
pub struct RecordSchema {
    discriminant: String,
    content: ContentShape,
}

impl RecordSchema {
    pub fn new(discriminant: impl Into<String>, content: ContentShape) -> Self {
        Self {
            discriminant: discriminant.into(),
            content,
        }
    }

    fn check_name(&self, name: &str) -> Result<(), String> {
        let prefix = format!("{}{}", self.discriminant, NAME_SEPARATOR);
        let label = name
            .strip_prefix(&prefix)
            .ok_or_else(|| format!("expected a name prefixed with \"{}\"", prefix))?;

        if label.trim().is_empty() {
            return Err("must not be empty".to_string());
        }
        if label.contains(NAME_SEPARATOR) {
            return Err(format!("must not contain '{}'", NAME_SEPARATOR));
        }

        Ok(())
    }
}

impl ContentSchema for RecordSchema {
    fn describe(&self) -> String {
        self.content.to_string()
    }

    fn check(&self, candidate: &Candidate) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if candidate.category != self.discriminant {
            violations.push(FieldViolation::new(
                "type",
                format!(
                    "expected \"{}\", found \"{}\"",
                    self.discriminant, candidate.category
                ),
            ));
        }

        match &candidate.name {
            None => violations.push(FieldViolation::new("name", "required")),
            Some(Value::String(name)) => {
                if let Err(reason) = self.check_name(name) {
                    violations.push(FieldViolation::new("name", reason));
                }
            }
            Some(other) => violations.push(FieldViolation::new(
                "name",
                format!("expected string, found {}", value_kind(other)),
            )),
        }

        match &candidate.content {
            None => violations.push(FieldViolation::new("content", "required")),
            Some(content) => {
                if let Err(reason) = self.content.check(content) {
                    violations.push(FieldViolation::new("content", reason));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
