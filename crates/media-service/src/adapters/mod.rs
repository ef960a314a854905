//! # Adapters

pub mod memory;

pub use memory::{InMemoryBlobStore, InMemoryMediaStore};
