//! Plain-text and JSON renderings of the four views.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::calculations::DisplayFigures;
use ledger_core::formatting::{format_currency, format_day, format_delta, format_month_title};
use ledger_core::models::{AnalyticsResult, Appointment, Client, FinancialEntry, ReportType};
use ledger_core::time_utils::{format_display_time, TimezoneHandler};
use serde_json::{json, Value};

const LABEL_WIDTH: usize = 18;

// ── Analytics ─────────────────────────────────────────────────────────────────

pub fn analytics_text(result: &AnalyticsResult, tz: &TimezoneHandler, currency: &str) -> String {
    let figures = DisplayFigures::from_result(result);
    let money = |v: i64| format_currency(v, currency);
    let busiest = match result.busiest_day {
        Some(day) => format!("{} ({} visits)", format_day(day), result.busiest_count),
        None => "-".to_string(),
    };

    let lines = [
        format!(
            "Analytics for {}",
            format_month_title(tz.local_date(result.month_start))
        ),
        String::new(),
        row(
            "Income",
            &format!(
                "{}  {}",
                money(result.total_income()),
                format_delta(result.diff_income, result.diff_income_pct, currency)
            ),
        ),
        row("  clients", &money(result.income_clients)),
        row("  reports", &money(result.income_reports)),
        row(
            "Expense",
            &format!(
                "{}  {}",
                money(result.total_expense()),
                format_delta(result.diff_expense, result.diff_expense_pct, currency)
            ),
        ),
        row("  clients", &money(result.expense_clients)),
        row("  reports", &money(result.expense_reports)),
        row(
            "Profit",
            &format!(
                "{}  {}",
                money(result.profit()),
                format_delta(result.diff_profit, result.diff_profit_pct, currency)
            ),
        ),
        String::new(),
        row("Average check", &money(figures.average_check)),
        row("Daily income", &money(figures.average_daily_income)),
        row("Daily expense", &money(figures.average_daily_expense)),
        row("Daily profit", &money(figures.average_daily_profit)),
        String::new(),
        row("Clients", &result.unique_clients.to_string()),
        row("Visits", &result.records_count.to_string()),
        row("Days worked", &result.days_worked.to_string()),
        row("Busiest day", &busiest),
    ];
    lines.join("\n")
}

pub fn analytics_json(result: &AnalyticsResult, tz: &TimezoneHandler) -> Value {
    json!({
        "month": tz.month_key(result.month_start),
        "analytics": result,
        "total_income": result.total_income(),
        "total_expense": result.total_expense(),
        "profit": result.profit(),
        "figures": DisplayFigures::from_result(result),
    })
}

// ── Reports ───────────────────────────────────────────────────────────────────

pub fn reports_text(
    month_start: DateTime<Utc>,
    entries: &[FinancialEntry],
    tz: &TimezoneHandler,
    currency: &str,
) -> String {
    let mut lines = vec![format!(
        "Reports for {}",
        format_month_title(tz.local_date(month_start))
    )];
    if entries.is_empty() {
        lines.push("No entries.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    let mut income = 0i64;
    let mut expense = 0i64;
    for e in entries {
        let sign = match e.kind {
            ReportType::Income => {
                income = e.amount.saturating_add(income);
                '+'
            }
            ReportType::Expense => {
                expense = e.amount.saturating_add(expense);
                '-'
            }
        };
        lines.push(format!(
            "#{:<5} {} {}  {}",
            e.id,
            sign,
            format_currency(e.amount, currency),
            e.label
        ));
    }
    lines.push(String::new());
    lines.push(row("Income", &format_currency(income, currency)));
    lines.push(row("Expense", &format_currency(expense, currency)));
    lines.join("\n")
}

// ── Schedule ──────────────────────────────────────────────────────────────────

pub fn schedule_text(
    date: NaiveDate,
    appointments: &[Appointment],
    client_names: &HashMap<i64, String>,
    tz: &TimezoneHandler,
    use_12h: bool,
    currency: &str,
) -> String {
    let mut lines = vec![format!("Schedule for {}", date.format("%d.%m.%Y"))];
    if appointments.is_empty() {
        lines.push("No appointments.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    for a in appointments {
        let start = format_display_time(&tz.local_datetime(a.date_start), use_12h);
        let end = format_display_time(&tz.local_datetime(a.date_end), use_12h);
        let name = client_names
            .get(&a.client_id)
            .map_or_else(|| format!("client #{}", a.client_id), Clone::clone);
        let mut line = format!("{start}-{end}  {name}");
        if let Some(income) = a.income {
            line.push_str(&format!("  +{}", format_currency(income, currency)));
        }
        if let Some(expense) = a.expense {
            line.push_str(&format!("  -{}", format_currency(expense, currency)));
        }
        if let Some(note) = a.note.as_deref().filter(|n| !n.is_empty()) {
            line.push_str(&format!("  ({note})"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

// ── Clients ───────────────────────────────────────────────────────────────────

pub fn clients_text(clients: &[Client], tz: &TimezoneHandler) -> String {
    if clients.is_empty() {
        return "No clients.".to_string();
    }
    clients
        .iter()
        .map(|c| {
            let phone = c.phone.as_deref().unwrap_or("-");
            let last = c
                .last_visit
                .map_or_else(|| "-".to_string(), |t| tz.local_date(t).format("%d.%m.%Y").to_string());
            format!("#{:<5} {:<24} {:<16} last visit {}", c.id, c.name, phone, last)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn row(label: &str, value: &str) -> String {
    format!("{:<width$}{}", label, value, width = LABEL_WIDTH)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
