//! # Domain Layer
//!
//! The authoritative post record and the errors of the post service.

pub mod entities;
pub mod errors;

pub use entities::{NewPost, PageRequest, Post, PostPage, MAX_CONTENT_CHARS};
pub use errors::{PostError, StoreError};
