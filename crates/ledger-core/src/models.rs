use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money in a [`FinancialEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    /// Money received outside of a client visit.
    Income,
    /// Money spent outside of a client visit (rent, supplies).
    Expense,
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Income => f.write_str("income"),
            ReportType::Expense => f.write_str("expense"),
        }
    }
}

/// A client of the business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Store-assigned identifier; `0` means "not yet inserted".
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Instant of the most recent visit, if known.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A scheduled client visit.
///
/// Income and expense are recorded after the service is completed, so both
/// are optional. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Store-assigned identifier; `0` means "not yet inserted".
    #[serde(default)]
    pub id: i64,
    pub client_id: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_end: DateTime<Utc>,
    #[serde(default)]
    pub income: Option<i64>,
    #[serde(default)]
    pub expense: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A standalone income or expense record bucketed to a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    /// Store-assigned identifier; `0` means "not yet inserted".
    #[serde(default)]
    pub id: i64,
    /// First instant of the month this entry belongs to.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub month_start: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ReportType,
    pub label: String,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Monthly statistics together with the comparison against the previous month.
///
/// Totals and profit are derived on access so they can never disagree with
/// their parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    /// Normalized month bucket this result describes.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub month_start: DateTime<Utc>,

    pub income_clients: i64,
    pub income_reports: i64,
    pub expense_clients: i64,
    pub expense_reports: i64,

    pub unique_clients: u32,
    pub records_count: u32,
    pub days_worked: u32,
    /// Local calendar day with the most appointments; `None` for an empty month.
    pub busiest_day: Option<NaiveDate>,
    pub busiest_count: u32,

    pub diff_income: i64,
    pub diff_expense: i64,
    pub diff_profit: i64,
    pub diff_income_pct: f64,
    pub diff_expense_pct: f64,
    pub diff_profit_pct: f64,
}

impl AnalyticsResult {
    /// An all-zero result for `month_start`.
    pub fn empty(month_start: DateTime<Utc>) -> Self {
        Self {
            month_start,
            income_clients: 0,
            income_reports: 0,
            expense_clients: 0,
            expense_reports: 0,
            unique_clients: 0,
            records_count: 0,
            days_worked: 0,
            busiest_day: None,
            busiest_count: 0,
            diff_income: 0,
            diff_expense: 0,
            diff_profit: 0,
            diff_income_pct: 0.0,
            diff_expense_pct: 0.0,
            diff_profit_pct: 0.0,
        }
    }

    pub fn total_income(&self) -> i64 {
        self.income_clients.saturating_add(self.income_reports)
    }

    pub fn total_expense(&self) -> i64 {
        self.expense_clients.saturating_add(self.expense_reports)
    }

    /// Total income minus total expense. May be negative. Saturates instead
    /// of overflowing.
    pub fn profit(&self) -> i64 {
        self.total_income().saturating_sub(self.total_expense())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn sample_result() -> AnalyticsResult {
        AnalyticsResult {
            income_clients: 12_000,
            income_reports: 3_000,
            expense_clients: 1_500,
            expense_reports: 20_000,
            ..AnalyticsResult::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        }
    }

    // ── AnalyticsResult ──────────────────────────────────────────────────────

    #[test]
    fn test_derived_totals() {
        let r = sample_result();
        assert_eq!(r.total_income(), 15_000);
        assert_eq!(r.total_expense(), 21_500);
        assert_eq!(r.profit(), -6_500);
    }

    #[test]
    fn test_derived_totals_saturate() {
        let r = AnalyticsResult {
            income_clients: i64::MAX,
            income_reports: 1,
            expense_clients: i64::MAX,
            expense_reports: i64::MAX,
            ..AnalyticsResult::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        };
        assert_eq!(r.total_income(), i64::MAX);
        assert_eq!(r.total_expense(), i64::MAX);
        assert_eq!(r.profit(), 0);

        let loss = AnalyticsResult {
            expense_clients: i64::MAX,
            ..AnalyticsResult::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        };
        assert_eq!(loss.profit(), -i64::MAX);
    }

    #[test]
    fn test_empty_result_is_all_zero() {
        let r = AnalyticsResult::empty(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(r.total_income(), 0);
        assert_eq!(r.total_expense(), 0);
        assert_eq!(r.profit(), 0);
        assert!(r.busiest_day.is_none());
        assert_eq!(r.busiest_count, 0);
        assert_eq!(r.diff_profit_pct, 0.0);
    }

    // ── Serde ────────────────────────────────────────────────────────────────

    #[test]
    fn test_appointment_timestamps_are_epoch_millis() {
        let json = r#"{"id":3,"client_id":7,"date_start":1704103200000,"date_end":1704106800000,"income":250000}"#;
        let a: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(a.id, 3);
        assert_eq!(a.client_id, 7);
        assert_eq!(
            a.date_start,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(a.income, Some(250_000));
        assert_eq!(a.expense, None);
        assert_eq!(a.note, None);

        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back["date_start"], 1_704_103_200_000_i64);
    }

    #[test]
    fn test_financial_entry_type_field() {
        let json = r#"{"id":1,"month_start":1704067200000,"type":"EXPENSE","label":"Rent","amount":3000000}"#;
        let e: FinancialEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.kind, ReportType::Expense);
        assert_eq!(e.label, "Rent");
        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back["type"], "EXPENSE");
    }

    #[test]
    fn test_client_optional_fields_default() {
        let c: Client = serde_json::from_str(r#"{"name":"Anna"}"#).unwrap();
        assert_eq!(c.id, 0);
        assert!(c.phone.is_none());
        assert!(c.last_visit.is_none());
    }

    #[test]
    fn test_report_type_display() {
        assert_eq!(ReportType::Income.to_string(), "income");
        assert_eq!(ReportType::Expense.to_string(), "expense");
    }
}
