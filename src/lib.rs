//! polycms - Polymorphic content store
//!
//! Stores heterogeneous content records (plain text, URLs, ...) in one
//! collection. Each record declares a category, and the schema registered
//! for that category decides what its payload may look like.
//!
//! # Architecture
//!
//! ```text
//! caller → ContentService ─┬─ ValidationEngine ── SchemaCatalog
//!                          └─ ContentRepository ── ContentStore (SQLite)
//! ```
//!
//! - Categories are registered once at startup; the built catalog is immutable
//! - Untyped input only ever reaches the validation engine
//! - Record names are stored as `"<category>:<name>"` and are unique across
//!   the collection; the store enforces that constraint
//!
//! # Modules
//!
//! - `catalog`: Category registry and payload schemas
//! - `validation`: Dispatch of raw input through category schemas
//! - `repository` / `store`: Persistence
//! - `service`: Operations exposed to callers
//! - `access`: Capability tokens issued by the authorization layer
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! polycms types
//! polycms add text welcome "hello"
//! polycms add url docs https://docs.rs
//! polycms list text
//! polycms delete <id>
//! ```

pub mod access;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod repository;
pub mod service;
pub mod store;
pub mod validation;

// Re-export main types at crate root for convenience
pub use access::{ReadAccess, WriteAccess};
pub use catalog::{
    CatalogBuilder, Category, CategorySummary, ContentShape, FieldViolation, SchemaCatalog,
};
pub use domain::{ContentRecord, NewContentRecord, RecordId};
pub use repository::ContentRepository;
pub use service::{ContentError, ContentService};
pub use store::{ContentStore, SqliteStore};
pub use validation::{RawInput, ValidationEngine};
