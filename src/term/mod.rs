//! Term-structure construction and spread derivation.
//!
//! Provides:
//! - Expiry resolution (contract -> days to expiry per date)
//! - The per-day ladder and spread engine
//! - Materialization into column-oriented output tables

pub mod engine;
pub mod expiry;
pub mod output;

pub use engine::{
    build_term_structure, DayTermStructure, EngineError, LadderEntry, SpreadPoint, TermStructure,
};
pub use expiry::{days_to_expiry, last_trade_dates};
pub use output::{materialize, SpreadTables};
