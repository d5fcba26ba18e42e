//! Domain types for polycms.
//!
//! - Record: persisted content records and their canonical names

pub mod record;

// Re-export commonly used types
pub use record::{canonical_name, ContentRecord, NewContentRecord, RecordId, NAME_SEPARATOR};
