//! # Ports
//!
//! Outbound interfaces the post service depends on.

pub mod outbound;

pub use outbound::PostRepository;
