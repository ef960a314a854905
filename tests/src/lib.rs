//! # Postline Cross-Service Tests
//!
//! End-to-end flows that span more than one service, wired the way the
//! binaries wire them but over in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # One process hosting every service
//!     ├── projections.rs  # Broker routing and idempotent projectors
//!     ├── post_flow.rs    # Post mutations reaching search and media
//!     └── admission.rs    # Rate limiting across tiers and windows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p svc-tests
//! cargo test -p svc-tests integration::admission::
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

#[cfg(test)]
mod integration;
