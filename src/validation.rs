//! Dispatch of untyped client input through category schemas.
//!
//! [`RawInput`] is the only form unvalidated input takes. It is consumed by
//! [`ValidationEngine::validate`], which produces the [`NewContentRecord`]
//! the repository accepts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::catalog::{Candidate, FieldViolation, SchemaCatalog};
use crate::domain::record::{canonical_name, NewContentRecord};

/// Errors that can occur during validation
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Invalid {category} content: {}", format_violations(.violations))]
    SchemaValidationFailed {
        category: String,
        violations: Vec<FieldViolation>,
    },
}

pub(crate) fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Untyped client payload, expected to carry at least `{name, content}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput(Value);

impl RawInput {
    /// Build input from a user-chosen name and content value
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        Self(serde_json::json!({
            "name": name.into(),
            "content": content,
        }))
    }

    /// Wrap an arbitrary JSON payload
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }
}

/// Validates raw input against the catalog
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    catalog: Arc<SchemaCatalog>,
}

impl ValidationEngine {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Validate input for a category, producing a record ready to store
    pub fn validate(
        &self,
        category_id: &str,
        input: RawInput,
    ) -> Result<NewContentRecord, ValidationError> {
        let category = self
            .catalog
            .get(category_id)
            .ok_or_else(|| ValidationError::CategoryNotFound(category_id.to_string()))?;

        let candidate = Self::assemble(category_id, &input);

        category
            .schema()
            .check(&candidate)
            .map_err(|violations| ValidationError::SchemaValidationFailed {
                category: category_id.to_string(),
                violations,
            })?;

        let Candidate {
            category,
            name,
            content,
        } = candidate;

        match (name, content) {
            (Some(Value::String(name)), Some(content)) => {
                Ok(NewContentRecord::new(category, name, content))
            }
            // A permissive schema let through a candidate that cannot be stored
            (name, content) => {
                let mut violations = Vec::new();
                if !matches!(name, Some(Value::String(_))) {
                    violations.push(FieldViolation::new("name", "expected string"));
                }
                if content.is_none() {
                    violations.push(FieldViolation::new("content", "required"));
                }
                Err(ValidationError::SchemaValidationFailed {
                    category,
                    violations,
                })
            }
        }
    }

    /// Build `{type, name: "<type>:<name>", content}` from raw input.
    ///
    /// Non-string names pass through untouched so the schema can report them.
    fn assemble(category_id: &str, input: &RawInput) -> Candidate {
        let name = input.field("name").map(|name| match name {
            Value::String(label) => Value::String(canonical_name(category_id, label)),
            other => other.clone(),
        });

        Candidate {
            category: category_id.to_string(),
            name,
            content: input.field("content").cloned(),
        }
    }
}
