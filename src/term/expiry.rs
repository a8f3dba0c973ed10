//! Contract expiry resolution.
//!
//! Maps contract metadata to per-date days-to-expiry. Calendar days, not
//! trading days: the annualization factor downstream accounts for the
//! trading-day convention.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::data::ContractMetadata;

/// Extract last tradeable dates from contract metadata.
///
/// Contracts with an empty or unparsable date are dropped here and are
/// therefore never eligible for ranking.
pub fn last_trade_dates(metadata: &ContractMetadata) -> HashMap<String, NaiveDate> {
    metadata
        .iter()
        .filter_map(|(contract, meta)| {
            meta.last_trade_date()
                .map(|date| (contract.clone(), date))
        })
        .collect()
}

/// Days to expiry for each contract still tradeable on `date`.
///
/// A contract expiring on `date` itself yields 0 and is included; one
/// that expired earlier is omitted. `min_days` raises the floor, dropping
/// contracts closer to expiry than the caller wants to rank.
pub fn days_to_expiry(
    date: NaiveDate,
    last_trade_dates: &HashMap<String, NaiveDate>,
    min_days: i64,
) -> HashMap<String, i64> {
    let mut result = HashMap::new();
    for (contract, &last_trade) in last_trade_dates {
        if last_trade < date {
            continue;
        }
        let days = (last_trade - date).num_days();
        if days >= min_days {
            result.insert(contract.clone(), days);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContractMeta;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn meta(last_trade_date: &str) -> ContractMeta {
        ContractMeta {
            last_trade_date: last_trade_date.to_string(),
            ..ContractMeta::default()
        }
    }

    #[test]
    fn test_last_trade_dates_drops_unparsable() {
        let metadata: ContractMetadata = [
            ("CLF24".to_string(), meta("2023-12-19")),
            ("CLG24".to_string(), meta("")),
            ("CLH24".to_string(), meta("unknown")),
        ]
        .into_iter()
        .collect();

        let dates = last_trade_dates(&metadata);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates["CLF24"], d(2023, 12, 19));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let dates: HashMap<String, NaiveDate> =
            [("CLF24".to_string(), d(2023, 12, 19))].into_iter().collect();

        // Expires today: included with 0 days.
        let today = days_to_expiry(d(2023, 12, 19), &dates, 0);
        assert_eq!(today.get("CLF24"), Some(&0));

        // Expired yesterday: excluded.
        let after = days_to_expiry(d(2023, 12, 20), &dates, 0);
        assert!(after.is_empty());
    }

    #[test]
    fn test_days_are_calendar_days() {
        let dates: HashMap<String, NaiveDate> =
            [("CLG24".to_string(), d(2024, 1, 22))].into_iter().collect();

        // Jan 2 -> Jan 22 spans weekends; calendar count is 20.
        let result = days_to_expiry(d(2024, 1, 2), &dates, 0);
        assert_eq!(result["CLG24"], 20);
    }

    #[test]
    fn test_min_days_floor() {
        let dates: HashMap<String, NaiveDate> = [
            ("CLF24".to_string(), d(2024, 1, 5)),
            ("CLG24".to_string(), d(2024, 1, 25)),
        ]
        .into_iter()
        .collect();

        let result = days_to_expiry(d(2024, 1, 2), &dates, 5);
        assert!(!result.contains_key("CLF24"));
        assert_eq!(result["CLG24"], 23);
    }

    #[test]
    fn test_resolver_is_pure() {
        let dates: HashMap<String, NaiveDate> =
            [("NGF24".to_string(), d(2023, 12, 27))].into_iter().collect();

        let a = days_to_expiry(d(2023, 12, 1), &dates, 0);
        let b = days_to_expiry(d(2023, 12, 1), &dates, 0);
        assert_eq!(a, b);
    }
}
