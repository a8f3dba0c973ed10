//! Persistence for calculated spread tables.
//!
//! Writes the five output tables for a commodity into
//! `<out_dir>/<commodity>/` as parquet, plus a `spread_info.json` sidecar
//! describing the calculation (timestamp, date range, column counts,
//! parameters) for downstream consumers.

use std::fs::File;
use std::path::PathBuf;

use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::SpreadConfig;
use crate::term::SpreadTables;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Calculation sidecar written next to the parquet outputs.
#[derive(Debug, Serialize, Deserialize)]
pub struct SpreadInfo {
    pub last_calculation: String,
    pub date_range: DateRange,
    pub spread_counts: SpreadCounts,
    pub max_months_forward: usize,
    pub trading_days_per_year: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpreadCounts {
    pub dollar: usize,
    pub percent: usize,
    pub annual: usize,
}

/// Writer for the processed-data directory layout (`<out_dir>/<commodity>/`).
pub struct SpreadStore {
    out_dir: PathBuf,
}

impl SpreadStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Persist all tables and the sidecar for one commodity.
    pub fn save(
        &self,
        commodity: &str,
        tables: &SpreadTables,
        config: &SpreadConfig,
    ) -> Result<(), StoreError> {
        let dir = self.out_dir.join(commodity);
        std::fs::create_dir_all(&dir)?;

        write_parquet(dir.join("monthly_futures.parquet"), &tables.monthly_futures)?;
        write_parquet(dir.join("spreads_dollar.parquet"), &tables.spreads_dollar)?;
        write_parquet(dir.join("spreads_percent.parquet"), &tables.spreads_percent)?;
        write_parquet(dir.join("spreads_annual.parquet"), &tables.spreads_annual)?;
        write_parquet(dir.join("days_to_expiry.parquet"), &tables.days_to_expiry)?;

        let info = spread_info(tables, config);
        let file = File::create(dir.join("spread_info.json"))?;
        serde_json::to_writer_pretty(file, &info)?;

        info!(commodity, dir = %dir.display(), "saved spread tables");
        Ok(())
    }
}

fn write_parquet(path: PathBuf, df: &DataFrame) -> Result<(), StoreError> {
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(&mut df.clone())?;
    Ok(())
}

/// Build the sidecar record for a set of tables.
pub fn spread_info(tables: &SpreadTables, config: &SpreadConfig) -> SpreadInfo {
    let (start, end) = tables.date_range().unwrap_or_default();
    SpreadInfo {
        last_calculation: Utc::now().to_rfc3339(),
        date_range: DateRange { start, end },
        spread_counts: SpreadCounts {
            dollar: tables.spreads_dollar.width().saturating_sub(1),
            percent: tables.spreads_percent.width().saturating_sub(1),
            annual: tables.spreads_annual.width().saturating_sub(1),
        },
        max_months_forward: config.max_months_forward,
        trading_days_per_year: config.trading_days_per_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_info_serializes() {
        let info = SpreadInfo {
            last_calculation: "2024-06-01T00:00:00+00:00".to_string(),
            date_range: DateRange {
                start: "1985-01-02".to_string(),
                end: "2024-05-31".to_string(),
            },
            spread_counts: SpreadCounts {
                dollar: 12,
                percent: 12,
                annual: 12,
            },
            max_months_forward: 13,
            trading_days_per_year: 251.0,
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["spread_counts"]["dollar"], 12);
        assert_eq!(json["date_range"]["start"], "1985-01-02");
        assert_eq!(json["max_months_forward"], 13);
    }
}
