pub mod loader;
pub mod store;
pub mod types;

pub use loader::{dataframe_to_price_table, load_wide_parquet, DataLoader, LoaderError};
pub use store::{spread_info, SpreadInfo, SpreadStore, StoreError};
pub use types::{ContractMeta, ContractMetadata, PriceTable, TableError};
