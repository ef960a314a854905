//! # Domain Layer

pub mod entities;
pub mod errors;

pub use entities::{MediaRecord, NewMedia};
pub use errors::{BlobError, StoreError};
