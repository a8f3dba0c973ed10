//! Data loader for commodity history files.
//!
//! Loads the per-commodity artifacts written by the fetch layer into the
//! type system for spread calculation:
//! - `prices.parquet` / `volumes.parquet`: wide frames with a date column
//!   and one float column per contract
//! - `metadata.json`: contract id -> reference record (name, units,
//!   last tradeable date)
//!
//! Date columns are tolerated as either strings or native dates, since
//! both appear in historical files.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use super::types::{ContractMeta, ContractMetadata, PriceTable, TableError};

/// Column names recognized as the day index of a wide frame.
const DATE_COLUMNS: &[&str] = &["date", "index", "__index_level_0__"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("malformed table: {0}")]
    Table(#[from] TableError),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loader for the raw-data directory layout (`<raw_dir>/<commodity>/`).
pub struct DataLoader {
    raw_dir: PathBuf,
}

impl DataLoader {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    fn commodity_path(&self, commodity: &str, file: &str) -> PathBuf {
        self.raw_dir.join(commodity).join(file)
    }

    /// List commodities with a price history on disk.
    pub fn available_commodities(&self) -> Result<Vec<String>, LoaderError> {
        if !self.raw_dir.exists() {
            return Ok(vec![]);
        }

        let mut commodities = Vec::new();
        for entry in std::fs::read_dir(&self.raw_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if self.commodity_path(&name, "prices.parquet").exists() {
                    commodities.push(name);
                }
            }
        }
        commodities.sort();
        Ok(commodities)
    }

    /// Load the price table for a commodity.
    pub fn load_prices(&self, commodity: &str) -> Result<PriceTable, LoaderError> {
        let path = self.commodity_path(commodity, "prices.parquet");
        load_wide_parquet(&path)
    }

    /// Load the volume table for a commodity, if one exists.
    pub fn load_volumes(&self, commodity: &str) -> Result<Option<PriceTable>, LoaderError> {
        let path = self.commodity_path(commodity, "volumes.parquet");
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(load_wide_parquet(&path)?))
    }

    /// Load contract metadata for a commodity.
    pub fn load_metadata(&self, commodity: &str) -> Result<ContractMetadata, LoaderError> {
        let path = self.commodity_path(commodity, "metadata.json");
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        let metadata: HashMap<String, ContractMeta> = serde_json::from_reader(file)?;
        Ok(metadata)
    }
}

/// Load a wide parquet frame (date column + one column per contract) into
/// a [`PriceTable`].
pub fn load_wide_parquet(path: &Path) -> Result<PriceTable, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let lf = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?;
    let df = lf.collect()?;
    dataframe_to_price_table(&df)
}

/// Convert a wide DataFrame into a [`PriceTable`].
///
/// The day index column is found by name (`date`, `index`, or the pandas
/// index column) with a fallback to the first column. Remaining columns
/// are contract columns and are cast to floats.
pub fn dataframe_to_price_table(df: &DataFrame) -> Result<PriceTable, LoaderError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let date_name = names
        .iter()
        .find(|n| DATE_COLUMNS.contains(&n.as_str()))
        .or_else(|| names.first())
        .ok_or_else(|| LoaderError::InvalidData("empty dataframe".to_string()))?
        .clone();

    let index = column_to_dates(df.column(date_name.as_str())?)?;

    let contracts: Vec<String> = names.into_iter().filter(|n| *n != date_name).collect();

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(contracts.len());
    for name in &contracts {
        let col = df.column(name.as_str())?.cast(&DataType::Float64)?;
        columns.push(col.f64()?.into_iter().collect());
    }

    // Transpose column-major parquet data into row-major cells.
    let mut cells = Vec::with_capacity(index.len() * contracts.len());
    for day in 0..index.len() {
        for col in &columns {
            cells.push(col[day]);
        }
    }

    Ok(PriceTable::new(index, contracts, cells)?)
}

/// Extract the day index from a column, handling string, date, and
/// datetime storage.
fn column_to_dates(col: &Column) -> Result<Vec<NaiveDate>, LoaderError> {
    if let Ok(str_col) = col.str() {
        return str_col
            .into_iter()
            .map(|s| {
                let s = s.ok_or_else(|| {
                    LoaderError::InvalidData("null day in date column".to_string())
                })?;
                // Datetime strings keep a time suffix; the date prefix is enough.
                let date_part = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map_err(|e| LoaderError::InvalidData(format!("bad date '{s}': {e}")))
            })
            .collect();
    }

    let casted = col.cast(&DataType::Date)?;
    let date_col = casted.date()?;
    date_col
        .as_date_iter()
        .map(|d| d.ok_or_else(|| LoaderError::InvalidData("null day in date column".to_string())))
        .collect()
}
