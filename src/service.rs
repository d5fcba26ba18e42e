//! Content service: the operations exposed to callers.
//!
//! Every operation is independent and stateless. The service holds only the
//! frozen catalog and a handle to the repository, so one instance can serve
//! any number of concurrent requests.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::access::{ReadAccess, WriteAccess};
use crate::catalog::{CategorySummary, FieldViolation, SchemaCatalog};
use crate::domain::{ContentRecord, RecordId};
use crate::repository::{ContentRepository, RepositoryError};
use crate::store::StoreError;
use crate::validation::{format_violations, RawInput, ValidationEngine, ValidationError};

/// Errors surfaced to callers of the content service
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Category not found: {category}")]
    CategoryNotFound { category: String },

    #[error("Invalid {category} content: {}", format_violations(.violations))]
    SchemaValidationFailed {
        category: String,
        violations: Vec<FieldViolation>,
    },

    #[error("Content name already exists: {name}")]
    Conflict { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ContentError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::CategoryNotFound(category) => {
                ContentError::CategoryNotFound { category }
            }
            ValidationError::SchemaValidationFailed { category, violations } => {
                ContentError::SchemaValidationFailed { category, violations }
            }
        }
    }
}

impl From<RepositoryError> for ContentError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateName(name) => ContentError::Conflict { name },
            RepositoryError::Store(err) => ContentError::Store(err),
        }
    }
}

/// Orchestrates validation and persistence of content
#[derive(Clone)]
pub struct ContentService {
    catalog: Arc<SchemaCatalog>,
    validator: ValidationEngine,
    repository: ContentRepository,
}

impl ContentService {
    /// Create a service over a frozen catalog and a repository
    pub fn new(catalog: Arc<SchemaCatalog>, repository: ContentRepository) -> Self {
        Self {
            validator: ValidationEngine::new(Arc::clone(&catalog)),
            catalog,
            repository,
        }
    }

    /// Validate and store a new record
    #[instrument(skip(self, writer, input), fields(user = %writer.caller().user_id))]
    pub async fn add(
        &self,
        writer: &WriteAccess,
        category_id: &str,
        input: RawInput,
    ) -> Result<ContentRecord, ContentError> {
        let record = self.validator.validate(category_id, input).map_err(|e| {
            warn!(error = %e, "Rejected content");
            ContentError::from(e)
        })?;

        let stored = self.repository.create(record).await.map_err(|e| {
            if let RepositoryError::DuplicateName(name) = &e {
                warn!(%name, "Content name already taken");
            }
            ContentError::from(e)
        })?;

        info!(id = %stored.id, name = %stored.name, "Content added");
        Ok(stored)
    }

    /// Records of a category. Unknown categories have nothing to show.
    #[instrument(skip(self, _reader))]
    pub async fn get_by_category(
        &self,
        _reader: &ReadAccess,
        category_id: &str,
    ) -> Result<Vec<ContentRecord>, ContentError> {
        if !self.catalog.contains(category_id) {
            debug!("Unknown category, returning no records");
            return Ok(Vec::new());
        }

        Ok(self.repository.list(category_id).await?)
    }

    /// Registered categories, for discovery
    pub fn get_types(&self) -> Vec<CategorySummary> {
        self.catalog.list().iter().map(|c| c.summary()).collect()
    }

    /// Delete a record by id; missing ids are not an error
    #[instrument(skip(self, writer), fields(user = %writer.caller().user_id))]
    pub async fn delete(&self, writer: &WriteAccess, id: &RecordId) -> Result<(), ContentError> {
        self.repository.delete_by_id(id).await?;

        info!("Content deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use serde_json::json;

    fn service() -> ContentService {
        let store = SqliteStore::open_in_memory().unwrap();
        ContentService::new(
            Arc::new(SchemaCatalog::standard()),
            ContentRepository::new(Arc::new(store)),
        )
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let service = service();
        let writer = WriteAccess::granted("tester");

        let stored = service
            .add(&writer, "text", RawInput::new("welcome", json!("hello")))
            .await
            .unwrap();
        assert_eq!(stored.category, "text");
        assert_eq!(stored.name, "text:welcome");

        let listed = service.get_by_category(&writer.read(), "text").await.unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let service = service();
        let writer = WriteAccess::granted("tester");

        let unknown = service
            .add(&writer, "video", RawInput::new("clip", json!("x")))
            .await
            .unwrap_err();
        assert!(matches!(
            unknown,
            ContentError::CategoryNotFound { ref category } if category == "video"
        ));

        let invalid = service
            .add(&writer, "url", RawInput::new("docs", json!("not-a-url")))
            .await
            .unwrap_err();
        assert!(matches!(invalid, ContentError::SchemaValidationFailed { .. }));

        service
            .add(&writer, "text", RawInput::new("welcome", json!("hello")))
            .await
            .unwrap();
        let conflict = service
            .add(&writer, "text", RawInput::new("welcome", json!("anything")))
            .await
            .unwrap_err();
        assert!(matches!(conflict, ContentError::Conflict { ref name } if name == "text:welcome"));
        assert_eq!(conflict.to_string(), "Content name already exists: text:welcome");
    }

    #[test]
    fn test_get_types() {
        let types = service().get_types();

        assert_eq!(
            types,
            vec![
                CategorySummary {
                    id: "text".to_string(),
                    display_name: "Text".to_string()
                },
                CategorySummary {
                    id: "url".to_string(),
                    display_name: "URL".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_validation_error_message_lists_fields() {
        let err = ContentError::SchemaValidationFailed {
            category: "url".to_string(),
            violations: vec![
                FieldViolation::new("name", "required"),
                FieldViolation::new("content", "expected string, found number"),
            ],
        };

        assert_eq!(
            err.to_string(),
            "Invalid url content: name: required; content: expected string, found number"
        );
    }
}
