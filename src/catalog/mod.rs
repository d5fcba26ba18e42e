//! Content category registry.
//!
//! Maps a category id to its display name and payload schema. The catalog is
//! assembled once with [`CatalogBuilder`] and frozen by [`CatalogBuilder::build`];
//! a built [`SchemaCatalog`] has no way to add or remove categories.
//!
//! # Standard categories
//!
//! | id     | display name | content            |
//! |--------|--------------|--------------------|
//! | `text` | Text         | any string         |
//! | `url`  | URL          | absolute URL       |

pub mod schema;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::CategoryConfig;
use crate::domain::record::NAME_SEPARATOR;

pub use schema::{Candidate, ContentSchema, ContentShape, FieldViolation, RecordSchema};

/// Id of the standard free-form text category
pub const TEXT: &str = "text";

/// Id of the standard URL category
pub const URL: &str = "url";

/// Errors raised while assembling a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Category already registered: {0}")]
    DuplicateCategory(String),

    #[error("Invalid category id {id:?}: {reason}")]
    InvalidCategoryId { id: String, reason: String },
}

/// A registered content category
#[derive(Clone)]
pub struct Category {
    id: String,
    display_name: String,
    schema: Arc<dyn ContentSchema>,
}

impl Category {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn schema(&self) -> &dyn ContentSchema {
        self.schema.as_ref()
    }

    /// Discovery view of this category
    pub fn summary(&self) -> CategorySummary {
        CategorySummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("schema", &self.schema.describe())
            .finish()
    }
}

/// `{id, displayName}` pair returned by category discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: String,
    pub display_name: String,
}

/// Collects categories during bootstrap
#[derive(Default)]
pub struct CatalogBuilder {
    categories: Vec<Category>,
}

impl CatalogBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder preloaded with the standard `text` and `url` categories
    pub fn standard() -> Self {
        let mut builder = Self::new();
        builder.push(TEXT, "Text", RecordSchema::new(TEXT, ContentShape::Text));
        builder.push(URL, "URL", RecordSchema::new(URL, ContentShape::Url));
        builder
    }

    /// Register a category with its own schema
    pub fn register(
        mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        schema: impl ContentSchema + 'static,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        validate_category_id(&id)?;

        if self.categories.iter().any(|c| c.id == id) {
            return Err(CatalogError::DuplicateCategory(id));
        }

        self.push(id, display_name, schema);
        Ok(self)
    }

    /// Register a category using a built-in content shape
    pub fn register_shape(
        self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        shape: ContentShape,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let schema = RecordSchema::new(id.clone(), shape);
        self.register(id, display_name, schema)
    }

    /// Register every category declared in configuration, in order
    pub fn register_configured(
        mut self,
        categories: &[CategoryConfig],
    ) -> Result<Self, CatalogError> {
        for category in categories {
            self = self.register_shape(&category.id, &category.display_name, category.shape)?;
        }
        Ok(self)
    }

    /// Freeze the catalog
    pub fn build(self) -> SchemaCatalog {
        let index = self
            .categories
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.id.clone(), pos))
            .collect();

        SchemaCatalog {
            categories: self.categories,
            index,
        }
    }

    fn push(
        &mut self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        schema: impl ContentSchema + 'static,
    ) {
        self.categories.push(Category {
            id: id.into(),
            display_name: display_name.into(),
            schema: Arc::new(schema),
        });
    }
}

fn validate_category_id(id: &str) -> Result<(), CatalogError> {
    let reason = if id.trim().is_empty() {
        "must not be empty".to_string()
    } else if id.contains(NAME_SEPARATOR) {
        format!("must not contain '{}'", NAME_SEPARATOR)
    } else {
        return Ok(());
    };

    Err(CatalogError::InvalidCategoryId {
        id: id.to_string(),
        reason,
    })
}

/// Immutable category registry, in registration order
#[derive(Debug)]
pub struct SchemaCatalog {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// Start assembling a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The standard catalog (`text`, `url`)
    pub fn standard() -> Self {
        CatalogBuilder::standard().build()
    }

    /// Look up a category by id
    pub fn get(&self, id: &str) -> Option<&Category> {
        self.index.get(id).map(|&pos| &self.categories[pos])
    }

    /// Check whether a category is registered
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All categories in registration order
    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    /// Get the number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = SchemaCatalog::standard();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(TEXT).unwrap().display_name(), "Text");
        assert_eq!(catalog.get(URL).unwrap().display_name(), "URL");
        assert!(catalog.get("video").is_none());
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let catalog = SchemaCatalog::builder()
            .register_shape("zeta", "Zeta", ContentShape::Text)
            .unwrap()
            .register_shape("alpha", "Alpha", ContentShape::Url)
            .unwrap()
            .register_shape("mid", "Mid", ContentShape::Text)
            .unwrap()
            .build();

        let ids: Vec<_> = catalog.list().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_registration() {
        let result = CatalogBuilder::standard().register_shape(TEXT, "Plain", ContentShape::Text);
        assert!(matches!(result, Err(CatalogError::DuplicateCategory(id)) if id == TEXT));
    }

    #[test]
    fn test_invalid_category_ids() {
        let empty = CatalogBuilder::new().register_shape("", "Empty", ContentShape::Text);
        assert!(matches!(empty, Err(CatalogError::InvalidCategoryId { .. })));

        let separator = CatalogBuilder::new().register_shape("a:b", "AB", ContentShape::Text);
        assert!(matches!(separator, Err(CatalogError::InvalidCategoryId { .. })));
    }

    #[test]
    fn test_register_configured() {
        let configured = vec![CategoryConfig {
            id: "link".to_string(),
            display_name: "Link".to_string(),
            shape: ContentShape::Url,
        }];

        let catalog = CatalogBuilder::standard()
            .register_configured(&configured)
            .unwrap()
            .build();

        let ids: Vec<_> = catalog.list().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![TEXT, URL, "link"]);
        assert_eq!(catalog.get("link").unwrap().schema().describe(), "url");
    }

    #[test]
    fn test_summary_wire_format() {
        let catalog = SchemaCatalog::standard();
        let summary = catalog.get(URL).unwrap().summary();

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value, serde_json::json!({"id": "url", "displayName": "URL"}));
    }
}
