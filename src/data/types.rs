//! Core data types for futures spread calculation.
//!
//! A commodity's history arrives as a wide price table (trading days x
//! contract columns) plus a metadata record per contract carrying the
//! last tradeable date. Both are loaded once per run and read-only.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date formats accepted for the last-tradeable-date field.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"];

#[derive(Error, Debug)]
pub enum TableError {
    #[error("duplicate day in price table index: {0}")]
    DuplicateDay(NaiveDate),

    #[error("price table index not ascending at {0}")]
    NonMonotonicDay(NaiveDate),

    #[error("cell count {cells} does not match {days} days x {contracts} contracts")]
    ShapeMismatch {
        cells: usize,
        days: usize,
        contracts: usize,
    },
}

/// Reference metadata for a single futures contract.
///
/// Fields mirror the vendor reference fields captured at fetch time. The
/// last tradeable date is kept as the raw string; contracts where it is
/// empty or unparsable are simply never ranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub units: String,

    #[serde(default)]
    pub last_trade_date: String,
}

impl ContractMeta {
    /// Parse the last tradeable date, tolerating the formats seen in
    /// historical metadata files. Returns `None` for empty or unparsable
    /// values.
    pub fn last_trade_date(&self) -> Option<NaiveDate> {
        let raw = self.last_trade_date.trim();
        if raw.is_empty() {
            return None;
        }
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

/// Contract metadata keyed by contract identifier.
pub type ContractMetadata = HashMap<String, ContractMeta>;

/// A dense day-indexed table of optional values, one column per contract.
///
/// Used for both prices and volumes. The constructor is the fatal
/// boundary for malformed input: the day index must be strictly
/// ascending with no duplicates, and the cell count must match the
/// index/column shape. Absent cells mean no trade, not yet listed, or
/// already expired in the source feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index: Vec<NaiveDate>,
    contracts: Vec<String>,
    // Row-major: cells[day * contracts.len() + col]
    cells: Vec<Option<f64>>,
}

impl PriceTable {
    pub fn new(
        index: Vec<NaiveDate>,
        contracts: Vec<String>,
        cells: Vec<Option<f64>>,
    ) -> Result<Self, TableError> {
        if cells.len() != index.len() * contracts.len() {
            return Err(TableError::ShapeMismatch {
                cells: cells.len(),
                days: index.len(),
                contracts: contracts.len(),
            });
        }
        for pair in index.windows(2) {
            if pair[1] == pair[0] {
                return Err(TableError::DuplicateDay(pair[1]));
            }
            if pair[1] < pair[0] {
                return Err(TableError::NonMonotonicDay(pair[1]));
            }
        }
        Ok(Self {
            index,
            contracts,
            cells,
        })
    }

    /// Trading-day index, strictly ascending.
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Contract column identifiers, in input order.
    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    pub fn n_days(&self) -> usize {
        self.index.len()
    }

    pub fn n_contracts(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.contracts.is_empty()
    }

    /// All cells for one trading day, in contract column order.
    pub fn row(&self, day: usize) -> &[Option<f64>] {
        let width = self.contracts.len();
        &self.cells[day * width..(day + 1) * width]
    }

    /// Single cell by day and contract column position.
    pub fn cell(&self, day: usize, col: usize) -> Option<f64> {
        self.cells[day * self.contracts.len() + col]
    }

    /// First and last day covered, if any rows exist.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.index.first()?, *self.index.last()?))
    }

    /// Whether this table shares another table's exact index and columns.
    pub fn is_aligned_with(&self, other: &PriceTable) -> bool {
        self.index == other.index && self.contracts == other.contracts
    }

    /// Fraction of cells that are present.
    pub fn fill_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let present = self.cells.iter().filter(|c| c.is_some()).count();
        present as f64 / self.cells.len() as f64
    }

    /// Fraction of cells holding exactly zero.
    pub fn zero_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let zeros = self.cells.iter().filter(|c| **c == Some(0.0)).count();
        zeros as f64 / self.cells.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_table_rejects_duplicate_days() {
        let index = vec![d(2024, 1, 2), d(2024, 1, 2)];
        let err = PriceTable::new(index, vec!["CLF24".to_string()], vec![Some(1.0), Some(2.0)]);
        assert!(matches!(err, Err(TableError::DuplicateDay(_))));
    }

    #[test]
    fn test_table_rejects_non_monotonic_days() {
        let index = vec![d(2024, 1, 3), d(2024, 1, 2)];
        let err = PriceTable::new(index, vec!["CLF24".to_string()], vec![Some(1.0), Some(2.0)]);
        assert!(matches!(err, Err(TableError::NonMonotonicDay(_))));
    }

    #[test]
    fn test_table_rejects_shape_mismatch() {
        let err = PriceTable::new(vec![d(2024, 1, 2)], vec!["CLF24".to_string()], vec![]);
        assert!(matches!(err, Err(TableError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_table_row_access() {
        let table = PriceTable::new(
            vec![d(2024, 1, 2), d(2024, 1, 3)],
            vec!["CLF24".to_string(), "CLG24".to_string()],
            vec![Some(70.0), None, Some(71.0), Some(71.5)],
        )
        .unwrap();

        assert_eq!(table.row(0), &[Some(70.0), None]);
        assert_eq!(table.cell(1, 1), Some(71.5));
        assert_eq!(table.date_range(), Some((d(2024, 1, 2), d(2024, 1, 3))));
        assert_eq!(table.fill_ratio(), 0.75);
    }

    #[test]
    fn test_contract_meta_date_parsing() {
        let meta = ContractMeta {
            name: "CRUDE OIL FUTR Jan24".to_string(),
            units: "USD/bbl".to_string(),
            last_trade_date: "2023-12-19".to_string(),
        };
        assert_eq!(meta.last_trade_date(), Some(d(2023, 12, 19)));

        let compact = ContractMeta {
            last_trade_date: "20231219".to_string(),
            ..ContractMeta::default()
        };
        assert_eq!(compact.last_trade_date(), Some(d(2023, 12, 19)));

        let empty = ContractMeta::default();
        assert_eq!(empty.last_trade_date(), None);

        let garbage = ContractMeta {
            last_trade_date: "n/a".to_string(),
            ..ContractMeta::default()
        };
        assert_eq!(garbage.last_trade_date(), None);
    }

    #[test]
    fn test_metadata_deserialize_tolerates_missing_fields() {
        let json = r#"{"CLF24 Comdty": {"name": "CRUDE OIL FUTR Jan24"}}"#;
        let metadata: ContractMetadata = serde_json::from_str(json).unwrap();
        let meta = &metadata["CLF24 Comdty"];
        assert_eq!(meta.name, "CRUDE OIL FUTR Jan24");
        assert!(meta.last_trade_date.is_empty());
        assert_eq!(meta.last_trade_date(), None);
    }
}
