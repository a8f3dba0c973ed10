//! Column-oriented output tables.
//!
//! Materializes the per-day records into the five tables consumed by the
//! persistence and visualization layers, in one pass:
//! - `monthly_futures`: `month_{i}_future` / `month_{i}_price` per rank
//! - `days_to_expiry`: `month_{i}_days` per rank
//! - `spreads_dollar` / `spreads_percent` / `spreads_annual`:
//!   `spread_1_{i}m`, `spread_1_{i}m_pct`, `spread_1_{i}m_pct_annual`
//!
//! Spread columns are positional by rank pair, not by contract identity:
//! `spread_1_2m` is always nearest-vs-second-nearest, so the series runs
//! continuously through contract rolls. Every table carries the full
//! input day index; days without eligible contracts are all-null rows.

use std::collections::HashMap;

use chrono::NaiveDate;
use polars::prelude::*;

use super::engine::{SpreadPoint, TermStructure};

/// The five output tables for one commodity.
#[derive(Debug, Clone)]
pub struct SpreadTables {
    pub monthly_futures: DataFrame,
    pub spreads_dollar: DataFrame,
    pub spreads_percent: DataFrame,
    pub spreads_annual: DataFrame,
    pub days_to_expiry: DataFrame,
}

impl SpreadTables {
    /// First and last day of the shared index, as ISO strings.
    pub fn date_range(&self) -> Option<(String, String)> {
        let col = self.monthly_futures.column("date").ok()?.str().ok()?;
        let first = col.get(0)?.to_string();
        let last = col.get(col.len() - 1)?.to_string();
        Some((first, last))
    }
}

/// Materialize a [`TermStructure`] into column-oriented tables.
pub fn materialize(ts: &TermStructure) -> Result<SpreadTables, PolarsError> {
    let n = ts.index.len();
    let row_of: HashMap<NaiveDate, usize> = ts
        .index
        .iter()
        .enumerate()
        .map(|(row, date)| (*date, row))
        .collect();

    let max_rank = ts.days.iter().map(|d| d.ladder.len()).max().unwrap_or(0);
    let dollar_ranks = max_spread_rank(ts, |s| s.dollar.is_some());
    let percent_ranks = max_spread_rank(ts, |s| s.percent.is_some());
    let annual_ranks = max_spread_rank(ts, |s| s.annualized.is_some());

    let mut future_cols = vec![vec![None::<String>; n]; max_rank];
    let mut price_cols = vec![vec![None::<f64>; n]; max_rank];
    let mut days_cols = vec![vec![None::<i64>; n]; max_rank];
    let mut dollar_cols = vec![vec![None::<f64>; n]; dollar_ranks.saturating_sub(1)];
    let mut percent_cols = vec![vec![None::<f64>; n]; percent_ranks.saturating_sub(1)];
    let mut annual_cols = vec![vec![None::<f64>; n]; annual_ranks.saturating_sub(1)];

    for day in &ts.days {
        let Some(&row) = row_of.get(&day.date) else {
            continue;
        };
        for (i, entry) in day.ladder.iter().enumerate() {
            future_cols[i][row] = Some(entry.contract.clone());
            price_cols[i][row] = Some(entry.price);
            days_cols[i][row] = Some(entry.days_to_expiry);
        }
        for spread in &day.spreads {
            let col = spread.far_rank - 2;
            if let Some(v) = spread.dollar {
                dollar_cols[col][row] = Some(v);
            }
            if let Some(v) = spread.percent {
                percent_cols[col][row] = Some(v);
            }
            if let Some(v) = spread.annualized {
                annual_cols[col][row] = Some(v);
            }
        }
    }

    let dates: Vec<String> = ts.index.iter().map(|d| d.to_string()).collect();

    let mut monthly = vec![date_column(&dates)];
    for (i, (futures, prices)) in future_cols.into_iter().zip(price_cols).enumerate() {
        let rank = i + 1;
        monthly.push(Column::new(format!("month_{rank}_future").into(), futures));
        monthly.push(Column::new(format!("month_{rank}_price").into(), prices));
    }

    let mut days = vec![date_column(&dates)];
    for (i, col) in days_cols.into_iter().enumerate() {
        days.push(Column::new(format!("month_{}_days", i + 1).into(), col));
    }

    Ok(SpreadTables {
        monthly_futures: DataFrame::new(monthly)?,
        spreads_dollar: spread_frame(&dates, dollar_cols, "spread_1_{}m")?,
        spreads_percent: spread_frame(&dates, percent_cols, "spread_1_{}m_pct")?,
        spreads_annual: spread_frame(&dates, annual_cols, "spread_1_{}m_pct_annual")?,
        days_to_expiry: DataFrame::new(days)?,
    })
}

/// Highest far rank holding any value of a spread kind, or 0 if none.
fn max_spread_rank<F>(ts: &TermStructure, has_value: F) -> usize
where
    F: Fn(&SpreadPoint) -> bool,
{
    ts.days
        .iter()
        .flat_map(|d| d.spreads.iter())
        .filter(|s| has_value(s))
        .map(|s| s.far_rank)
        .max()
        .unwrap_or(0)
}

fn date_column(dates: &[String]) -> Column {
    Column::new("date".into(), dates)
}

fn spread_frame(
    dates: &[String],
    cols: Vec<Vec<Option<f64>>>,
    pattern: &str,
) -> Result<DataFrame, PolarsError> {
    let mut columns = vec![date_column(dates)];
    for (i, col) in cols.into_iter().enumerate() {
        let name = pattern.replacen("{}", &(i + 2).to_string(), 1);
        columns.push(Column::new(name.into(), col));
    }
    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpreadConfig;
    use crate::data::{ContractMeta, ContractMetadata, PriceTable};
    use crate::term::engine::build_term_structure;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn meta(last_trade_date: NaiveDate) -> ContractMeta {
        ContractMeta {
            last_trade_date: last_trade_date.to_string(),
            ..ContractMeta::default()
        }
    }

    fn fixture() -> (PriceTable, ContractMetadata) {
        // Day 2 has no prices, so it materializes as an all-null row.
        let index = vec![d(2024, 3, 1), d(2024, 3, 2), d(2024, 3, 3)];
        let contracts = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let cells = vec![
            Some(100.0), Some(101.0), Some(102.0),
            None, None, None,
            Some(100.5), Some(101.5), Some(102.5),
        ];
        let prices = PriceTable::new(index, contracts, cells).unwrap();

        let metadata: ContractMetadata = [
            ("A".to_string(), meta(d(2024, 3, 10))),
            ("B".to_string(), meta(d(2024, 3, 25))),
            ("C".to_string(), meta(d(2024, 4, 20))),
        ]
        .into_iter()
        .collect();

        (prices, metadata)
    }

    #[test]
    fn test_column_naming() {
        let (prices, metadata) = fixture();
        let ts =
            build_term_structure(&prices, None, &metadata, &SpreadConfig::default()).unwrap();
        let tables = materialize(&ts).unwrap();

        let names: Vec<String> = tables
            .monthly_futures
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "date",
                "month_1_future",
                "month_1_price",
                "month_2_future",
                "month_2_price",
                "month_3_future",
                "month_3_price",
            ]
        );

        let names: Vec<String> = tables
            .spreads_dollar
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["date", "spread_1_2m", "spread_1_3m"]);

        let names: Vec<String> = tables
            .spreads_annual
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["date", "spread_1_2m_pct_annual", "spread_1_3m_pct_annual"]
        );

        let names: Vec<String> = tables
            .days_to_expiry
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["date", "month_1_days", "month_2_days", "month_3_days"]
        );
    }

    #[test]
    fn test_full_index_preserved_with_null_gaps() {
        let (prices, metadata) = fixture();
        let ts =
            build_term_structure(&prices, None, &metadata, &SpreadConfig::default()).unwrap();
        let tables = materialize(&ts).unwrap();

        assert_eq!(tables.monthly_futures.height(), 3);
        assert_eq!(tables.spreads_dollar.height(), 3);

        // The gap day is present but empty.
        let near = tables
            .monthly_futures
            .column("month_1_future")
            .unwrap()
            .str()
            .unwrap()
            .get(1);
        assert_eq!(near, None);

        let spread = tables
            .spreads_dollar
            .column("spread_1_2m")
            .unwrap()
            .f64()
            .unwrap()
            .get(1);
        assert_eq!(spread, None);

        assert_eq!(
            tables.date_range(),
            Some(("2024-03-01".to_string(), "2024-03-03".to_string()))
        );
    }

    #[test]
    fn test_spread_values_land_in_rank_columns() {
        let (prices, metadata) = fixture();
        let config = SpreadConfig {
            trading_days_per_year: 252.0,
            ..SpreadConfig::default()
        };
        let ts = build_term_structure(&prices, None, &metadata, &config).unwrap();
        let tables = materialize(&ts).unwrap();

        let dollar = tables
            .spreads_dollar
            .column("spread_1_2m")
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(dollar.get(0), Some(1.0));
        assert_eq!(dollar.get(2), Some(1.0));

        let days = tables
            .days_to_expiry
            .column("month_1_days")
            .unwrap()
            .i64()
            .unwrap();
        assert_eq!(days.get(0), Some(9));
    }

    #[test]
    fn test_disabled_kind_yields_zero_columns() {
        let (prices, metadata) = fixture();
        let config = SpreadConfig {
            calculate_annual_spreads: false,
            ..SpreadConfig::default()
        };
        let ts = build_term_structure(&prices, None, &metadata, &config).unwrap();
        let tables = materialize(&ts).unwrap();

        // Date column only.
        assert_eq!(tables.spreads_annual.width(), 1);
        assert_eq!(tables.spreads_dollar.width(), 3);
        assert_eq!(tables.spreads_percent.width(), 3);
    }

    #[test]
    fn test_materialization_is_idempotent() {
        let (prices, metadata) = fixture();
        let ts =
            build_term_structure(&prices, None, &metadata, &SpreadConfig::default()).unwrap();
        let a = materialize(&ts).unwrap();
        let b = materialize(&ts).unwrap();

        assert!(a.monthly_futures.equals_missing(&b.monthly_futures));
        assert!(a.spreads_dollar.equals_missing(&b.spreads_dollar));
        assert!(a.spreads_percent.equals_missing(&b.spreads_percent));
        assert!(a.spreads_annual.equals_missing(&b.spreads_annual));
        assert!(a.days_to_expiry.equals_missing(&b.days_to_expiry));
    }
}
