//! Cross-service flows.

mod admission;
mod fixtures;
mod post_flow;
mod projections;
