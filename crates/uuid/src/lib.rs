//! Identifier and sharded-path utilities.
//!
//! PharmaStackX stores marketplace records (medicine requests, pharmacies,
//! carts) under sharded directories derived from a UUID.
//!
//! To keep path derivation deterministic and consistent across the codebase,
//! storage identifiers use a *canonical* UUID representation: **32 lowercase
//! hexadecimal characters** (no hyphens).
//!
//! This module provides:
//! - A wrapper type ([`RecordUuid`]) that *guarantees* the canonical format
//!   once constructed.
//! - Shared sharding logic to derive record directory locations from an
//!   identifier.
//! - A timestamp-prefixed identifier ([`TimestampUuid`]) used for pharmacy
//!   quotes, so quote ids order by submission time within a request.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is *required* for externally supplied identifiers (CLI and
//! API inputs). Use [`RecordUuid::parse`] to validate an input string;
//! non-canonical values (uppercase, hyphenated, wrong length, non-hex) are
//! rejected.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, records live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `market_data/requests/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! This scheme bounds per-directory fan-out so request volume does not
//! degrade filesystem performance.

mod service;

// Re-export public types
pub use service::{RecordUuid, TimestampUuid, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
