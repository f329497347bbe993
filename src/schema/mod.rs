//! Schema discovery caching.

mod cache;

pub use cache::{Fields, SchemaCache};
