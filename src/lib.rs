pub mod config;
pub mod data;
pub mod term;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, SpreadConfig};
pub use data::{ContractMeta, ContractMetadata, DataLoader, PriceTable, SpreadStore};
pub use term::{
    build_term_structure, materialize, DayTermStructure, EngineError, LadderEntry, SpreadPoint,
    SpreadTables, TermStructure,
};
pub use validation::{validate_commodity, DataIntegrityReport};
