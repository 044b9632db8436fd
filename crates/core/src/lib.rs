//! # PharmaStackX Core
//!
//! Core business logic for the PharmaStackX medicine-request marketplace.
//!
//! This crate contains pure data operations and file/folder management:
//! - Medicine request lifecycle (submission, quoting, acceptance,
//!   cancellation, refill) with sharded JSON storage
//! - Pharmacy registry and patient carts
//! - Distance enrichment and quote ranking
//! - Append-only per-request audit trail
//!
//! **No API concerns**: HTTP servers, wire DTOs, or push notification belong
//! in `api-rest` and `api-shared`.

pub mod cart;
pub mod config;
pub mod constants;
pub mod distance;
pub mod error;
pub mod history;
pub mod quote;
pub mod ranking;
pub mod repositories;
pub mod request;

pub use config::CoreConfig;
pub use error::{RequestError, RequestResult};
pub use psx_uuid::{RecordUuid, TimestampUuid};
