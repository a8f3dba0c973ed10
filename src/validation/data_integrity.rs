//! Data integrity validation for commodity history.
//!
//! Validates loaded price/volume tables and metadata before spread
//! calculation:
//! - Non-empty price table
//! - Price/volume index and column alignment
//! - Complete-missingness detection
//! - Zero-price share (warns above 1% of cells)
//! - Metadata expiry coverage (price columns with a parsable last
//!   tradeable date)
//!
//! These checks are diagnostic; the fatal boundary for malformed tables
//! lives in the `PriceTable` constructor.

use crate::data::{ContractMetadata, PriceTable};

/// Zero-price share above this fraction fails the check.
const MAX_ZERO_PRICE_RATIO: f64 = 0.01;

/// Result of a single validation check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete integrity report for one commodity.
#[derive(Debug)]
pub struct DataIntegrityReport {
    pub commodity: String,
    pub trading_days: usize,
    pub contracts: usize,
    pub checks: Vec<CheckResult>,
}

impl DataIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} ({} trading days, {} contracts): {}/{} checks passed",
            self.commodity,
            self.trading_days,
            self.contracts,
            passed,
            self.checks.len()
        )
    }
}

/// Run all integrity checks on a commodity's loaded data.
pub fn validate_commodity(
    commodity: &str,
    prices: &PriceTable,
    volumes: Option<&PriceTable>,
    metadata: &ContractMetadata,
) -> DataIntegrityReport {
    let mut checks = vec![check_non_empty(prices)];

    if let Some(volumes) = volumes {
        checks.push(check_volume_alignment(prices, volumes));
    }

    checks.push(check_missingness(prices));
    checks.push(check_zero_prices(prices));
    checks.push(check_expiry_coverage(prices, metadata));

    DataIntegrityReport {
        commodity: commodity.to_string(),
        trading_days: prices.n_days(),
        contracts: prices.n_contracts(),
        checks,
    }
}

fn check_non_empty(prices: &PriceTable) -> CheckResult {
    if prices.is_empty() {
        CheckResult::fail("non_empty", "Price table has no rows or columns", None)
    } else {
        CheckResult::pass(
            "non_empty",
            &format!(
                "{} trading days x {} contracts",
                prices.n_days(),
                prices.n_contracts()
            ),
        )
    }
}

fn check_volume_alignment(prices: &PriceTable, volumes: &PriceTable) -> CheckResult {
    if volumes.is_aligned_with(prices) {
        CheckResult::pass("volume_alignment", "Volume table matches price table")
    } else {
        CheckResult::fail(
            "volume_alignment",
            "Index mismatch between prices and volumes",
            Some(format!(
                "prices: {} days x {} contracts, volumes: {} days x {} contracts",
                prices.n_days(),
                prices.n_contracts(),
                volumes.n_days(),
                volumes.n_contracts()
            )),
        )
    }
}

fn check_missingness(prices: &PriceTable) -> CheckResult {
    let fill = prices.fill_ratio();
    if fill == 0.0 {
        CheckResult::fail("missingness", "Complete data missingness found", None)
    } else {
        CheckResult::pass(
            "missingness",
            &format!("{:.1}% of cells populated", fill * 100.0),
        )
    }
}

fn check_zero_prices(prices: &PriceTable) -> CheckResult {
    let ratio = prices.zero_ratio();
    if ratio > MAX_ZERO_PRICE_RATIO {
        CheckResult::fail(
            "zero_prices",
            "High percentage of zero prices found",
            Some(format!("{:.2}% of cells are zero", ratio * 100.0)),
        )
    } else {
        CheckResult::pass(
            "zero_prices",
            &format!("{:.2}% of cells are zero", ratio * 100.0),
        )
    }
}

fn check_expiry_coverage(prices: &PriceTable, metadata: &ContractMetadata) -> CheckResult {
    let covered = prices
        .contracts()
        .iter()
        .filter(|c| {
            metadata
                .get(*c)
                .and_then(|m| m.last_trade_date())
                .is_some()
        })
        .count();
    let total = prices.n_contracts();

    if covered == 0 && total > 0 {
        CheckResult::fail(
            "expiry_coverage",
            "No contract has a parsable last tradeable date",
            None,
        )
    } else {
        let uncovered = total - covered;
        let message = format!("{covered}/{total} contracts have a last tradeable date");
        if uncovered > 0 {
            CheckResult::pass(
                "expiry_coverage",
                &format!("{message} ({uncovered} never ranked)"),
            )
        } else {
            CheckResult::pass("expiry_coverage", &message)
        }
    }
}
