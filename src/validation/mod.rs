//! Validation for loaded commodity data.
//!
//! Diagnostic integrity checks over price/volume tables and contract
//! metadata, run before spread calculation.

pub mod data_integrity;

pub use data_integrity::{validate_commodity, CheckResult, DataIntegrityReport};
