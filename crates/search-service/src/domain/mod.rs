//! # Domain Layer

pub mod entities;
pub mod errors;
pub mod query;

pub use entities::SearchRecord;
pub use errors::StoreError;
pub use query::{SearchQuery, MAX_RESULTS};
