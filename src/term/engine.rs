//! Term-structure and calendar-spread engine.
//!
//! For every trading day, ranks all contracts with a valid price by days
//! to expiry, keeps the nearest `max_months_forward`, and computes
//! spreads between the nearest contract and each further-out month:
//! - dollar: far - near
//! - percent: (far - near) / near
//! - annualized percent: percent * trading_days_per_year / day gap
//!
//! Day computations are independent, so they run in parallel and are
//! merged back into ascending day order. Per-day anomalies (no eligible
//! contracts, zero near price, non-positive day gap) degrade to absent
//! values; only malformed input is an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, SpreadConfig};
use crate::data::{ContractMetadata, PriceTable};

use super::expiry;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("volume table does not share the price table's index and columns")]
    VolumeMisaligned,
}

/// One rung of a day's futures ladder. Rank 1 is the near contract.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderEntry {
    pub contract: String,
    pub price: f64,
    pub days_to_expiry: i64,
}

/// Spreads between the near contract and the contract at `far_rank`.
///
/// Each kind is `None` when disabled by configuration or not computable
/// for this day and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadPoint {
    pub far_rank: usize,
    pub dollar: Option<f64>,
    pub percent: Option<f64>,
    pub annualized: Option<f64>,
}

/// Immutable result of one day's term-structure computation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTermStructure {
    pub date: NaiveDate,
    /// Nearest contracts, ascending by days to expiry, at most
    /// `max_months_forward` entries.
    pub ladder: Vec<LadderEntry>,
    pub spreads: Vec<SpreadPoint>,
}

/// Full-run result: one record per day that had eligible contracts, plus
/// the complete input day index for output materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStructure {
    pub index: Vec<NaiveDate>,
    pub days: Vec<DayTermStructure>,
}

/// Build the term structure and spreads for a commodity's price history.
///
/// `volumes`, when supplied, must share the price table's index and
/// columns; contracts below `min_volume` on a day are then excluded from
/// that day's ranking.
pub fn build_term_structure(
    prices: &PriceTable,
    volumes: Option<&PriceTable>,
    metadata: &ContractMetadata,
    config: &SpreadConfig,
) -> Result<TermStructure, EngineError> {
    config.validate()?;

    if let Some(volumes) = volumes {
        if !volumes.is_aligned_with(prices) {
            return Err(EngineError::VolumeMisaligned);
        }
    }

    let last_trade = expiry::last_trade_dates(metadata);
    debug!(
        contracts = prices.n_contracts(),
        with_expiry = last_trade.len(),
        days = prices.n_days(),
        "building term structure"
    );

    let mut days: Vec<DayTermStructure> = (0..prices.n_days())
        .into_par_iter()
        .filter_map(|day| {
            compute_day(
                prices.index()[day],
                prices.row(day),
                volumes.map(|v| v.row(day)),
                prices.contracts(),
                &last_trade,
                config,
            )
        })
        .collect();

    // Consumers assume a monotonically increasing day index.
    days.sort_by_key(|d| d.date);

    Ok(TermStructure {
        index: prices.index().to_vec(),
        days,
    })
}

/// Rank one day's contracts and derive its spreads.
///
/// Pure function of the day's price/volume row and the expiry map;
/// returns `None` when no contract is both priced and unexpired.
fn compute_day(
    date: NaiveDate,
    prices: &[Option<f64>],
    volumes: Option<&[Option<f64>]>,
    contracts: &[String],
    last_trade: &HashMap<String, NaiveDate>,
    config: &SpreadConfig,
) -> Option<DayTermStructure> {
    let days_to_expiry = expiry::days_to_expiry(date, last_trade, config.min_days_to_expiry);

    let mut eligible: Vec<(usize, f64, i64)> = Vec::new();
    for (col, price) in prices.iter().enumerate() {
        let Some(price) = *price else { continue };
        if config.min_volume > 0.0 {
            if let Some(volumes) = volumes {
                match volumes[col] {
                    Some(v) if v >= config.min_volume => {}
                    _ => continue,
                }
            }
        }
        let Some(&days) = days_to_expiry.get(&contracts[col]) else {
            continue;
        };
        eligible.push((col, price, days));
    }

    if eligible.is_empty() {
        return None;
    }

    // Stable sort keeps input column order on equal expiries.
    eligible.sort_by_key(|&(_, _, days)| days);
    eligible.truncate(config.max_months_forward);

    let ladder: Vec<LadderEntry> = eligible
        .iter()
        .map(|&(col, price, days)| LadderEntry {
            contract: contracts[col].clone(),
            price,
            days_to_expiry: days,
        })
        .collect();

    let spreads = compute_spreads(&ladder, config);

    Some(DayTermStructure {
        date,
        ladder,
        spreads,
    })
}

/// Spreads between rank 1 and each further rank of a day's ladder.
fn compute_spreads(ladder: &[LadderEntry], config: &SpreadConfig) -> Vec<SpreadPoint> {
    let Some(near) = ladder.first() else {
        return Vec::new();
    };
    // A zero near price or a leg already at expiry makes the ratios
    // meaningless; skip the day's spreads rather than emit them.
    if ladder.len() < 2 || near.price == 0.0 || near.days_to_expiry == 0 {
        return Vec::new();
    }

    let mut spreads = Vec::with_capacity(ladder.len() - 1);
    for (i, far) in ladder.iter().enumerate().skip(1) {
        if far.days_to_expiry == 0 {
            continue;
        }

        let dollar = far.price - near.price;
        let percent = dollar / near.price;
        let day_gap = far.days_to_expiry - near.days_to_expiry;
        let annualized =
            (day_gap > 0).then(|| percent * (config.trading_days_per_year / day_gap as f64));

        spreads.push(SpreadPoint {
            far_rank: i + 1,
            dollar: config.calculate_dollar_spreads.then_some(dollar),
            percent: config.calculate_percent_spreads.then_some(percent),
            annualized: if config.calculate_annual_spreads {
                annualized
            } else {
                None
            },
        });
    }
    spreads
}
