//! Monthly analytics over appointments and financial entries.
//!
//! A month is summarized on its own ([`summarize`]) and then merged with the
//! summary of the previous calendar month ([`compare_months`]) to fill the
//! month-over-month fields of [`AnalyticsResult`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::calculations::percent_change;
use ledger_core::error::Result;
use ledger_core::models::{AnalyticsResult, Appointment, FinancialEntry, ReportType};
use ledger_core::time_utils::TimezoneHandler;
use tracing::{debug, warn};

use crate::sources::{AppointmentReader, ReportReader};

// ── Pure functions ────────────────────────────────────────────────────────────

/// Summarize one month from records that already belong to it.
///
/// `month_start` must be a normalized bucket. The comparison fields of the
/// returned value are zero.
pub fn summarize(
    month_start: DateTime<Utc>,
    appointments: &[Appointment],
    entries: &[FinancialEntry],
    tz: &TimezoneHandler,
) -> AnalyticsResult {
    let income_clients = saturating_sum(appointments.iter().map(|a| a.income.unwrap_or(0)));
    let expense_clients = saturating_sum(appointments.iter().map(|a| a.expense.unwrap_or(0)));
    let income_reports = sum_by_type(entries, ReportType::Income);
    let expense_reports = sum_by_type(entries, ReportType::Expense);

    // BTreeMap keeps days ordered so ties go to the earliest date.
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for a in appointments {
        *per_day.entry(tz.local_date(a.date_start)).or_insert(0) += 1;
    }
    let busiest = per_day
        .iter()
        .fold(None, |best: Option<(NaiveDate, u32)>, (&day, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((day, count)),
        });

    let unique_clients: HashSet<i64> = appointments.iter().map(|a| a.client_id).collect();

    AnalyticsResult {
        income_clients,
        income_reports,
        expense_clients,
        expense_reports,
        unique_clients: count(unique_clients.len()),
        records_count: count(appointments.len()),
        days_worked: count(per_day.len()),
        busiest_day: busiest.map(|(day, _)| day),
        busiest_count: busiest.map_or(0, |(_, n)| n),
        ..AnalyticsResult::empty(month_start)
    }
}

/// Fill the month-over-month fields of `current` from `previous`.
///
/// Only `current`'s own statistics survive; `previous` is a baseline.
pub fn compare_months(current: AnalyticsResult, previous: &AnalyticsResult) -> AnalyticsResult {
    AnalyticsResult {
        diff_income: current.total_income().saturating_sub(previous.total_income()),
        diff_expense: current.total_expense().saturating_sub(previous.total_expense()),
        diff_profit: current.profit().saturating_sub(previous.profit()),
        diff_income_pct: percent_change(previous.total_income(), current.total_income()),
        diff_expense_pct: percent_change(previous.total_expense(), current.total_expense()),
        diff_profit_pct: percent_change(previous.profit(), current.profit()),
        ..current
    }
}

fn sum_by_type(entries: &[FinancialEntry], kind: ReportType) -> i64 {
    saturating_sum(entries.iter().filter(|e| e.kind == kind).map(|e| e.amount))
}

/// Money sums clamp at the `i64` bounds rather than overflow.
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Computes [`AnalyticsResult`]s on demand from injected readers.
///
/// Holds no state besides its collaborators; every call reads afresh.
#[derive(Clone)]
pub struct MonthlyAggregator {
    appointments: Arc<dyn AppointmentReader>,
    reports: Arc<dyn ReportReader>,
    tz: TimezoneHandler,
}

impl MonthlyAggregator {
    pub fn new(
        appointments: Arc<dyn AppointmentReader>,
        reports: Arc<dyn ReportReader>,
        tz: TimezoneHandler,
    ) -> Self {
        Self {
            appointments,
            reports,
            tz,
        }
    }

    pub fn timezone(&self) -> &TimezoneHandler {
        &self.tz
    }

    /// Statistics for the month containing `month_start`, without comparison.
    pub fn summarize_month(&self, month_start: DateTime<Utc>) -> Result<AnalyticsResult> {
        let bucket = self.tz.month_start_of(month_start);
        let (from, to) = self.tz.month_range(bucket);

        let appointments = self.appointments.between(from, to)?;
        let entries = self.reports.by_month(bucket)?;

        debug!(
            month = %self.tz.month_key(bucket),
            appointments = appointments.len(),
            entries = entries.len(),
            "summarizing month"
        );

        Ok(summarize(bucket, &appointments, &entries, &self.tz))
    }

    /// Full analytics for the month containing `month_start`, compared with
    /// the month before it.
    ///
    /// `current_local_date` (today when `None`) only feeds the elapsed-month
    /// check, which is logged but not enforced here; gating belongs to the
    /// caller via [`TimezoneHandler::can_build`].
    pub fn compute_monthly_analytics(
        &self,
        month_start: DateTime<Utc>,
        current_local_date: Option<NaiveDate>,
    ) -> Result<AnalyticsResult> {
        let bucket = self.tz.month_start_of(month_start);
        let today = current_local_date.unwrap_or_else(|| self.tz.today());
        if !self.tz.can_build(bucket, today) {
            warn!(
                month = %self.tz.month_key(bucket),
                "building analytics for a month that has not fully elapsed"
            );
        }

        let current = self.summarize_month(bucket)?;
        let previous = self.summarize_month(self.tz.previous_month(bucket))?;
        Ok(compare_months(current, &previous))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemoryStore;
    use chrono::{Duration, TimeZone};
    use ledger_core::error::LedgerError;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn visit(
        id: i64,
        client_id: i64,
        start: DateTime<Utc>,
        income: Option<i64>,
        expense: Option<i64>,
    ) -> Appointment {
        Appointment {
            id,
            client_id,
            date_start: start,
            date_end: start + Duration::hours(1),
            income,
            expense,
            note: None,
        }
    }

    fn entry(id: i64, month_start: DateTime<Utc>, kind: ReportType, amount: i64) -> FinancialEntry {
        FinancialEntry {
            id,
            month_start,
            kind,
            label: format!("entry {id}"),
            amount,
        }
    }

    fn aggregator(store: MemoryStore, tz: &str) -> MonthlyAggregator {
        let store = Arc::new(store);
        MonthlyAggregator::new(store.clone(), store, TimezoneHandler::new(tz))
    }

    struct FailingReader;

    impl AppointmentReader for FailingReader {
        fn between(&self, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<Vec<Appointment>> {
            Err(LedgerError::unavailable("appointments", "connection reset"))
        }
    }

    impl ReportReader for FailingReader {
        fn by_month(&self, _: DateTime<Utc>) -> Result<Vec<FinancialEntry>> {
            Err(LedgerError::unavailable("reports", "connection reset"))
        }
    }

    // ── summarize ────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_sums_and_counts() {
        let tz = TimezoneHandler::new("UTC");
        let jan = utc(2024, 1, 1, 0, 0, 0);
        let apps = vec![
            visit(1, 10, utc(2024, 1, 3, 9, 0, 0), Some(200_000), Some(10_000)),
            visit(2, 11, utc(2024, 1, 3, 12, 0, 0), Some(150_000), None),
            visit(3, 10, utc(2024, 1, 9, 9, 0, 0), None, None),
        ];
        let entries = vec![
            entry(1, jan, ReportType::Income, 50_000),
            entry(2, jan, ReportType::Expense, 300_000),
            entry(3, jan, ReportType::Expense, 20_000),
        ];

        let r = summarize(jan, &apps, &entries, &tz);
        assert_eq!(r.month_start, jan);
        assert_eq!(r.income_clients, 350_000);
        assert_eq!(r.expense_clients, 10_000);
        assert_eq!(r.income_reports, 50_000);
        assert_eq!(r.expense_reports, 320_000);
        assert_eq!(r.total_income(), 400_000);
        assert_eq!(r.total_expense(), 330_000);
        assert_eq!(r.profit(), 70_000);
        assert_eq!(r.unique_clients, 2);
        assert_eq!(r.records_count, 3);
        assert_eq!(r.days_worked, 2);
        assert_eq!(r.busiest_day, Some(date(2024, 1, 3)));
        assert_eq!(r.busiest_count, 2);
    }

    #[test]
    fn test_summarize_busiest_day_two_five_one() {
        let tz = TimezoneHandler::new("UTC");
        let mut apps = Vec::new();
        let mut id = 0;
        for (day, n) in [(4, 2), (12, 5), (20, 1)] {
            for hour in 0..n {
                id += 1;
                apps.push(visit(id, id, utc(2024, 1, day, 9 + hour, 0, 0), None, None));
            }
        }
        let r = summarize(utc(2024, 1, 1, 0, 0, 0), &apps, &[], &tz);
        assert_eq!(r.busiest_day, Some(date(2024, 1, 12)));
        assert_eq!(r.busiest_count, 5);
        assert_eq!(r.days_worked, 3);
        assert_eq!(r.records_count, 8);
    }

    #[test]
    fn test_summarize_busiest_day_tie_picks_earliest() {
        let tz = TimezoneHandler::new("UTC");
        let apps = vec![
            visit(1, 1, utc(2024, 1, 20, 9, 0, 0), None, None),
            visit(2, 2, utc(2024, 1, 20, 11, 0, 0), None, None),
            visit(3, 3, utc(2024, 1, 7, 9, 0, 0), None, None),
            visit(4, 4, utc(2024, 1, 7, 11, 0, 0), None, None),
        ];
        let r = summarize(utc(2024, 1, 1, 0, 0, 0), &apps, &[], &tz);
        assert_eq!(r.busiest_day, Some(date(2024, 1, 7)));
        assert_eq!(r.busiest_count, 2);
    }

    #[test]
    fn test_summarize_groups_days_in_local_zone() {
        // 21:30 UTC and 22:30 UTC fall on different days in Moscow (+03:00).
        let tz = TimezoneHandler::new("Europe/Moscow");
        let apps = vec![
            visit(1, 1, utc(2024, 1, 10, 20, 30, 0), None, None),
            visit(2, 2, utc(2024, 1, 10, 21, 30, 0), None, None),
            visit(3, 3, utc(2024, 1, 10, 22, 30, 0), None, None),
        ];
        let r = summarize(utc(2023, 12, 31, 21, 0, 0), &apps, &[], &tz);
        assert_eq!(r.days_worked, 2);
        assert_eq!(r.busiest_day, Some(date(2024, 1, 11)));
        assert_eq!(r.busiest_count, 2);
    }

    #[test]
    fn test_summarize_saturates_huge_amounts() {
        let tz = TimezoneHandler::new("UTC");
        let jan = utc(2024, 1, 1, 0, 0, 0);
        let apps = vec![
            visit(1, 1, utc(2024, 1, 3, 9, 0, 0), Some(i64::MAX), None),
            visit(2, 2, utc(2024, 1, 4, 9, 0, 0), Some(1), None),
        ];
        let entries = vec![entry(1, jan, ReportType::Income, i64::MAX)];
        let r = summarize(jan, &apps, &entries, &tz);
        assert_eq!(r.income_clients, i64::MAX);
        assert_eq!(r.total_income(), i64::MAX);
        assert_eq!(r.profit(), i64::MAX);

        let previous = AnalyticsResult {
            expense_reports: i64::MAX,
            ..AnalyticsResult::empty(utc(2023, 12, 1, 0, 0, 0))
        };
        let compared = compare_months(r, &previous);
        assert_eq!(compared.diff_income, i64::MAX);
        assert_eq!(compared.diff_expense, -i64::MAX);
        assert!(compared.diff_profit_pct.is_finite());
    }

    #[test]
    fn test_summarize_empty() {
        let tz = TimezoneHandler::new("UTC");
        let jan = utc(2024, 1, 1, 0, 0, 0);
        assert_eq!(summarize(jan, &[], &[], &tz), AnalyticsResult::empty(jan));
    }

    // ── compare_months ───────────────────────────────────────────────────────

    #[test]
    fn test_compare_months_fifty_percent_growth() {
        let jan = utc(2024, 1, 1, 0, 0, 0);
        let feb = utc(2024, 2, 1, 0, 0, 0);
        let previous = AnalyticsResult {
            income_clients: 10_000,
            ..AnalyticsResult::empty(jan)
        };
        let current = AnalyticsResult {
            income_clients: 12_000,
            income_reports: 3_000,
            ..AnalyticsResult::empty(feb)
        };
        let r = compare_months(current, &previous);
        assert_eq!(r.month_start, feb);
        assert_eq!(r.diff_income, 5_000);
        assert_eq!(r.diff_income_pct, 50.0);
        assert_eq!(r.diff_expense, 0);
        assert_eq!(r.diff_expense_pct, 0.0);
        assert_eq!(r.diff_profit, 5_000);
        assert_eq!(r.diff_profit_pct, 50.0);
    }

    #[test]
    fn test_compare_months_zero_baseline() {
        let previous = AnalyticsResult::empty(utc(2024, 1, 1, 0, 0, 0));
        let current = AnalyticsResult {
            income_clients: 10_000,
            ..AnalyticsResult::empty(utc(2024, 2, 1, 0, 0, 0))
        };
        let r = compare_months(current, &previous);
        assert_eq!(r.diff_income, 10_000);
        assert_eq!(r.diff_income_pct, 0.0);
        assert_eq!(r.diff_profit, 10_000);
        assert_eq!(r.diff_profit_pct, 0.0);
    }

    #[test]
    fn test_compare_months_decline_and_negative_profit() {
        let previous = AnalyticsResult {
            income_clients: 20_000,
            expense_reports: 5_000,
            ..AnalyticsResult::empty(utc(2024, 1, 1, 0, 0, 0))
        };
        let current = AnalyticsResult {
            income_clients: 4_000,
            expense_reports: 10_000,
            ..AnalyticsResult::empty(utc(2024, 2, 1, 0, 0, 0))
        };
        let r = compare_months(current, &previous);
        assert_eq!(r.profit(), -6_000);
        assert_eq!(r.diff_income, -16_000);
        assert_eq!(r.diff_income_pct, -80.0);
        assert_eq!(r.diff_expense, 5_000);
        assert_eq!(r.diff_expense_pct, 100.0);
        assert_eq!(r.diff_profit, -21_000);
        assert_eq!(r.diff_profit_pct, -140.0);
    }

    // ── MonthlyAggregator ────────────────────────────────────────────────────

    #[test]
    fn test_empty_months_yield_all_zero_result() {
        let agg = aggregator(MemoryStore::new(), "UTC");
        let r = agg
            .compute_monthly_analytics(utc(2024, 3, 17, 8, 0, 0), Some(date(2024, 6, 1)))
            .unwrap();
        assert_eq!(r, AnalyticsResult::empty(utc(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_month_boundary_january_february() {
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 1, 31, 23, 59, 59), Some(1_000), None),
                visit(2, 2, utc(2024, 2, 1, 0, 0, 0), Some(2_000), None),
            ],
            vec![],
        );
        let agg = aggregator(store, "UTC");
        let today = Some(date(2024, 6, 1));

        let jan = agg
            .compute_monthly_analytics(utc(2024, 1, 1, 0, 0, 0), today)
            .unwrap();
        assert_eq!(jan.records_count, 1);
        assert_eq!(jan.income_clients, 1_000);
        assert_eq!(jan.busiest_day, Some(date(2024, 1, 31)));

        let feb = agg
            .compute_monthly_analytics(utc(2024, 2, 1, 0, 0, 0), today)
            .unwrap();
        assert_eq!(feb.records_count, 1);
        assert_eq!(feb.income_clients, 2_000);
        assert_eq!(feb.diff_income, 1_000);
        assert_eq!(feb.diff_income_pct, 100.0);
    }

    #[test]
    fn test_month_boundary_in_local_zone() {
        // Moscow is +03:00: 2024-01-31 23:59:59 local is 20:59:59 UTC.
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 1, 31, 20, 59, 59), Some(1_000), None),
                visit(2, 2, utc(2024, 1, 31, 21, 0, 0), Some(2_000), None),
            ],
            vec![],
        );
        let agg = aggregator(store, "Europe/Moscow");
        let jan = agg.summarize_month(utc(2024, 1, 15, 12, 0, 0)).unwrap();
        let feb = agg.summarize_month(utc(2024, 2, 15, 12, 0, 0)).unwrap();
        assert_eq!(jan.income_clients, 1_000);
        assert_eq!(feb.income_clients, 2_000);
        assert_eq!(feb.busiest_day, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_leap_february_includes_the_29th() {
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 2, 29, 18, 0, 0), Some(5_000), None),
                visit(2, 1, utc(2024, 2, 29, 23, 59, 59), Some(5_000), None),
                visit(3, 1, utc(2024, 3, 1, 0, 0, 0), Some(7_000), None),
            ],
            vec![],
        );
        let agg = aggregator(store, "UTC");
        let feb = agg.summarize_month(utc(2024, 2, 1, 0, 0, 0)).unwrap();
        assert_eq!(feb.records_count, 2);
        assert_eq!(feb.income_clients, 10_000);
        assert_eq!(feb.busiest_day, Some(date(2024, 2, 29)));
        assert_eq!(feb.unique_clients, 1);

        let mar = agg.summarize_month(utc(2024, 3, 1, 0, 0, 0)).unwrap();
        assert_eq!(mar.records_count, 1);
    }

    #[test]
    fn test_common_february_ends_on_the_28th() {
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2023, 2, 28, 23, 59, 59), Some(5_000), None),
                visit(2, 1, utc(2023, 3, 1, 0, 0, 0), Some(7_000), None),
            ],
            vec![],
        );
        let agg = aggregator(store, "UTC");
        let feb = agg.summarize_month(utc(2023, 2, 10, 0, 0, 0)).unwrap();
        assert_eq!(feb.records_count, 1);
        assert_eq!(feb.income_clients, 5_000);
    }

    #[test]
    fn test_month_across_dst_change() {
        // Berlin: March 2024 runs from 02-29 23:00 UTC to 03-31 21:59:59 UTC.
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 2, 29, 23, 0, 0), Some(1), None),
                visit(2, 2, utc(2024, 3, 31, 21, 59, 59), Some(10), None),
                visit(3, 3, utc(2024, 3, 31, 22, 0, 0), Some(100), None),
            ],
            vec![],
        );
        let agg = aggregator(store, "Europe/Berlin");
        let march = agg.summarize_month(utc(2024, 3, 10, 12, 0, 0)).unwrap();
        assert_eq!(march.income_clients, 11);
        assert_eq!(march.days_worked, 2);

        let april = agg.summarize_month(utc(2024, 4, 10, 12, 0, 0)).unwrap();
        assert_eq!(april.income_clients, 100);
        assert_eq!(april.busiest_day, Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_entries_match_bucket_exactly() {
        let jan = utc(2024, 1, 1, 0, 0, 0);
        let store = MemoryStore::with_data(
            vec![],
            vec![
                entry(1, jan, ReportType::Income, 1_000),
                entry(2, jan + Duration::days(3), ReportType::Income, 9_999),
                entry(3, jan, ReportType::Expense, 400),
            ],
        );
        let agg = aggregator(store, "UTC");
        let r = agg.summarize_month(utc(2024, 1, 20, 0, 0, 0)).unwrap();
        assert_eq!(r.income_reports, 1_000);
        assert_eq!(r.expense_reports, 400);
        assert_eq!(r.records_count, 0);
        assert!(r.busiest_day.is_none());
    }

    #[test]
    fn test_compute_compares_against_previous_month() {
        let jan = utc(2024, 1, 1, 0, 0, 0);
        let feb = utc(2024, 2, 1, 0, 0, 0);
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 1, 10, 10, 0, 0), Some(10_000), Some(1_000)),
                visit(2, 1, utc(2024, 2, 10, 10, 0, 0), Some(12_000), Some(500)),
                visit(3, 2, utc(2024, 2, 11, 10, 0, 0), None, None),
            ],
            vec![
                entry(1, jan, ReportType::Expense, 1_000),
                entry(2, feb, ReportType::Income, 3_000),
                entry(3, feb, ReportType::Expense, 2_500),
            ],
        );
        let agg = aggregator(store, "UTC");
        let r = agg
            .compute_monthly_analytics(feb, Some(date(2024, 3, 5)))
            .unwrap();

        assert_eq!(r.total_income(), 15_000);
        assert_eq!(r.total_expense(), 3_000);
        assert_eq!(r.profit(), 12_000);
        assert_eq!(r.unique_clients, 2);
        assert_eq!(r.days_worked, 2);
        // January: income 10_000, expense 2_000, profit 8_000.
        assert_eq!(r.diff_income, 5_000);
        assert_eq!(r.diff_income_pct, 50.0);
        assert_eq!(r.diff_expense, 1_000);
        assert_eq!(r.diff_expense_pct, 50.0);
        assert_eq!(r.diff_profit, 4_000);
        assert_eq!(r.diff_profit_pct, 50.0);
    }

    #[test]
    fn test_compute_normalizes_any_instant_in_month() {
        let store = MemoryStore::with_data(
            vec![visit(1, 1, utc(2024, 5, 2, 10, 0, 0), Some(700), None)],
            vec![],
        );
        let agg = aggregator(store, "UTC");
        let today = Some(date(2024, 7, 1));
        let a = agg
            .compute_monthly_analytics(utc(2024, 5, 1, 0, 0, 0), today)
            .unwrap();
        let b = agg
            .compute_monthly_analytics(utc(2024, 5, 31, 23, 0, 0), today)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.month_start, utc(2024, 5, 1, 0, 0, 0));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let store = MemoryStore::with_data(
            vec![
                visit(1, 1, utc(2024, 4, 2, 10, 0, 0), Some(3_333), Some(111)),
                visit(2, 2, utc(2024, 5, 2, 10, 0, 0), Some(7_777), None),
            ],
            vec![entry(1, utc(2024, 5, 1, 0, 0, 0), ReportType::Expense, 999)],
        );
        let agg = aggregator(store, "UTC");
        let month = utc(2024, 5, 1, 0, 0, 0);
        let first = agg.compute_monthly_analytics(month, None).unwrap();
        let second = agg.compute_monthly_analytics(month, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.diff_income_pct.to_bits(),
            second.diff_income_pct.to_bits()
        );
    }

    #[test]
    fn test_compute_ignores_elapsed_check() {
        let store = MemoryStore::with_data(
            vec![visit(1, 1, utc(2024, 5, 2, 10, 0, 0), Some(700), None)],
            vec![],
        );
        let agg = aggregator(store, "UTC");
        let r = agg
            .compute_monthly_analytics(utc(2024, 5, 1, 0, 0, 0), Some(date(2024, 5, 15)))
            .unwrap();
        assert_eq!(r.income_clients, 700);
    }

    #[test]
    fn test_reader_failure_propagates() {
        let failing = Arc::new(FailingReader);
        let agg = MonthlyAggregator::new(
            failing.clone(),
            failing,
            TimezoneHandler::new("UTC"),
        );
        let err = agg
            .compute_monthly_analytics(utc(2024, 1, 1, 0, 0, 0), None)
            .unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_report_reader_failure_propagates() {
        let agg = MonthlyAggregator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FailingReader),
            TimezoneHandler::new("UTC"),
        );
        assert!(matches!(
            agg.summarize_month(utc(2024, 1, 1, 0, 0, 0)),
            Err(LedgerError::DataUnavailable { .. })
        ));
    }
}
