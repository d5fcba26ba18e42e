//! Durable store interface for content records.
//!
//! The store assigns ids and timestamps and enforces uniqueness of
//! `name`. Everything above it treats it as the single source of truth for
//! that constraint.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContentRecord, NewContentRecord, RecordId};

pub use sqlite::SqliteStore;

/// Errors reported by a content store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated on {field}: {value}")]
    Conflict { field: String, value: String },

    #[error("Store error: {0}")]
    Backend(String),
}

/// Record filter for [`ContentStore::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    /// Only records of this category
    pub category: Option<String>,
}

impl ContentFilter {
    /// Match every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records of one category
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Durable storage for content records
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a record, failing with [`StoreError::Conflict`] if its name is taken
    async fn create(&self, record: NewContentRecord) -> Result<ContentRecord, StoreError>;

    /// Records matching the filter, in store order
    async fn find(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>, StoreError>;

    /// Delete a record; deleting a missing id is not an error
    async fn delete_one(&self, id: &RecordId) -> Result<(), StoreError>;
}
