//! CRUD façade over the content store.
//!
//! The repository knows nothing about categories: it stores whatever
//! validated record it is handed and lists by raw category id.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::{ContentRecord, NewContentRecord, RecordId};
use crate::store::{ContentFilter, ContentStore, StoreError};

/// Errors that can occur in the repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Name already exists: {0}")]
    DuplicateName(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { value, .. } => RepositoryError::DuplicateName(value),
            other => RepositoryError::Store(other),
        }
    }
}

/// Content persistence over a shared store
#[derive(Clone)]
pub struct ContentRepository {
    store: Arc<dyn ContentStore>,
}

impl ContentRepository {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Insert a record. Name collisions come from the store's own constraint.
    pub async fn create(&self, record: NewContentRecord) -> Result<ContentRecord, RepositoryError> {
        Ok(self.store.create(record).await?)
    }

    /// All records of a category, in store order
    pub async fn list(&self, category_id: &str) -> Result<Vec<ContentRecord>, RepositoryError> {
        let records = self
            .store
            .find(&ContentFilter::by_category(category_id))
            .await?;

        debug!(category = category_id, count = records.len(), "listed records");
        Ok(records)
    }

    /// Delete a record if present
    pub async fn delete_by_id(&self, id: &RecordId) -> Result<(), RepositoryError> {
        Ok(self.store.delete_one(id).await?)
    }
}
