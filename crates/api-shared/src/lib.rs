//! # API Shared
//!
//! Shared utilities and definitions for the PharmaStackX APIs.
//!
//! Contains:
//! - Wire DTOs (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//! - API-key validation for the pharmacy write path
//!
//! DTOs are deliberately primitive (strings, numbers, options): the REST
//! crate converts between them and the domain types in `psx-core`, so the
//! wire contract can stay stable while the domain model evolves.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
