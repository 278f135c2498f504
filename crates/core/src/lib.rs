//! Billbook Core - Domain entities, services, and traits.
//!
//! This crate contains the monthly ledger engine: projection of recurring
//! obligations into dated items, overdue sweeping, period totals and pay/unpay
//! reconciliation. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod errors;
pub mod income;
pub mod ledger;
pub mod obligations;
pub mod reports;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
