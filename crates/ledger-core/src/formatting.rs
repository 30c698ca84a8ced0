use chrono::NaiveDate;

use crate::error::{LedgerError, Result};

/// Format an amount in minor currency units (kopecks, cents) as a decimal
/// string with thousands separators.
///
/// # Examples
///
/// ```
/// use ledger_core::formatting::format_money;
///
/// assert_eq!(format_money(123_456), "1,234.56");
/// assert_eq!(format_money(5), "0.05");
/// assert_eq!(format_money(-250_000), "-2,500.00");
/// ```
pub fn format_money(minor: i64) -> String {
    let negative = minor < 0;
    let abs = minor.unsigned_abs();
    let major = abs / 100;
    let cents = abs % 100;

    let grouped = group_thousands(&major.to_string());
    if negative {
        format!("-{}.{:02}", grouped, cents)
    } else {
        format!("{}.{:02}", grouped, cents)
    }
}

/// [`format_money`] followed by the currency symbol.
///
/// ```
/// use ledger_core::formatting::format_currency;
///
/// assert_eq!(format_currency(100_000, "₽"), "1,000.00 ₽");
/// ```
pub fn format_currency(minor: i64, symbol: &str) -> String {
    if symbol.is_empty() {
        format_money(minor)
    } else {
        format!("{} {}", format_money(minor), symbol)
    }
}

/// Render a month-over-month change, e.g. `"↑ 1,000.00 ₽ (50.0%)"`.
///
/// The arrow carries the sign; both numbers are shown as magnitudes.
pub fn format_delta(diff: i64, pct: f64, symbol: &str) -> String {
    let arrow = if diff >= 0 { '↑' } else { '↓' };
    format!(
        "{} {} ({:.1}%)",
        arrow,
        format_currency(diff.saturating_abs(), symbol),
        pct.abs()
    )
}

/// Parse a non-negative decimal amount in major units (`"1500"`,
/// `"1,500.5"`, `"99.99"`) into minor units.
///
/// ```
/// use ledger_core::formatting::parse_money;
///
/// assert_eq!(parse_money("1,500.50").unwrap(), 150_050);
/// assert_eq!(parse_money("7").unwrap(), 700);
/// ```
pub fn parse_money(s: &str) -> Result<i64> {
    let invalid = || LedgerError::InvalidAmount(s.to_string());
    let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != ' ').collect();
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let (major, minor) = match cleaned.split_once('.') {
        Some((major, minor)) if digits(minor) && minor.len() <= 2 => (major, minor),
        Some(_) => return Err(invalid()),
        None => (cleaned.as_str(), ""),
    };
    if !digits(major) {
        return Err(invalid());
    }

    let major: i64 = major.parse().map_err(|_| invalid())?;
    let minor: i64 = match minor.len() {
        0 => 0,
        1 => minor.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => minor.parse().map_err(|_| invalid())?,
    };
    major
        .checked_mul(100)
        .and_then(|m| m.checked_add(minor))
        .ok_or_else(invalid)
}

/// `"March 2024"`.
pub fn format_month_title(month: NaiveDate) -> String {
    month.format("%B %Y").to_string()
}

/// `"15.03"`: day and month of a busiest-day style label.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
