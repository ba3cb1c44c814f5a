//! Report calculations.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;

use super::types::{MonthlyTotal, TotalStats};
use crate::budget::round_half_up;

/// Report service for aggregation logic.
pub struct ReportService;

impl ReportService {
    /// Builds totals from a database sum and count.
    #[must_use]
    pub fn totals(sum: Option<Decimal>, count: u64) -> TotalStats {
        let total_amount = sum.unwrap_or(Decimal::ZERO);
        let average_amount = if count == 0 {
            Decimal::ZERO
        } else {
            round_half_up(total_amount / Decimal::from(count))
        };

        TotalStats {
            total_amount,
            total_count: count,
            average_amount,
        }
    }

    /// Groups dated amounts by UTC calendar month, newest month first.
    #[must_use]
    pub fn monthly_totals<I>(rows: I) -> Vec<MonthlyTotal>
    where
        I: IntoIterator<Item = (DateTime<Utc>, Decimal)>,
    {
        let mut months: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
        for (date, amount) in rows {
            let entry = months
                .entry(date.format("%Y-%m").to_string())
                .or_insert((Decimal::ZERO, 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        months
            .into_iter()
            .rev()
            .map(|(month, (total_amount, expense_count))| MonthlyTotal {
                month,
                total_amount,
                expense_count,
            })
            .collect()
    }

    /// Resolves the window for monthly totals; defaults to the twelve months up to `now`.
    #[must_use]
    pub fn monthly_window(
        now: DateTime<Utc>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = start.unwrap_or_else(|| now.checked_sub_months(Months::new(12)).unwrap_or(now));
        (start, end.unwrap_or(now))
    }
}
