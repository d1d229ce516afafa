//! Validation utilities
//!
//! Re-reads written collections to confirm the destination application
//! will load them

mod roundtrip;

pub use roundtrip::{validate_collection, validate_migration, ValidationSummary};
