use serde::Serialize;

use crate::models::AnalyticsResult;

/// Percentage change from `previous` to `current`.
///
/// Returns `0.0` when the baseline is zero. The result can exceed 100% and
/// can be negative; a negative baseline is used as-is.
pub fn percent_change(previous: i64, current: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (current as f64 - previous as f64) * 100.0 / previous as f64
}

/// Per-day and per-client figures shown next to the monthly totals.
///
/// All values are integer minor units; divisions truncate toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayFigures {
    /// Client income per unique client.
    pub average_check: i64,
    pub average_daily_income: i64,
    pub average_daily_expense: i64,
    pub average_daily_profit: i64,
}

impl DisplayFigures {
    pub fn from_result(result: &AnalyticsResult) -> Self {
        let days = effective_days(result.days_worked);
        Self {
            average_check: average_check(result.income_clients, result.unique_clients),
            average_daily_income: result.total_income() / days,
            average_daily_expense: result.total_expense() / days,
            average_daily_profit: result.profit() / days,
        }
    }
}

/// Divisor for per-day averages; never below one.
pub fn effective_days(days_worked: u32) -> i64 {
    i64::from(days_worked.max(1))
}

/// `income_clients / unique_clients`, or `0` with no clients.
pub fn average_check(income_clients: i64, unique_clients: u32) -> i64 {
    if unique_clients == 0 {
        0
    } else {
        income_clients / i64::from(unique_clients)
    }
}
