//! Calendar math in the operator's local time zone.
//!
//! Every month bucket, month range and "calendar day" in the ledger is
//! computed here. Instants are stored as UTC; conversion to wall-clock time
//! always goes through a [`TimezoneHandler`].

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{LedgerError, Result};

/// Seconds from local midnight to 23:59:59, the inclusive end of a day.
const END_OF_DAY_SECS: i64 = 86_399;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Pure date helpers ─────────────────────────────────────────────────────────

/// Day 1 of `date`'s month.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Last calendar day of `date`'s month, honouring month length and leap years.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .map_or(NaiveDate::MAX, |next| next - Duration::days(1))
}

/// Parse a `YYYY-MM` month string into day 1 of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| LedgerError::InvalidMonth(s.to_string()))
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::InvalidDate(s.to_string()))
}

/// Parse a wall-clock `YYYY-MM-DD HH:MM` string (a `T` separator is also
/// accepted). The result still needs [`TimezoneHandler::resolve_local`].
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| LedgerError::InvalidTime(s.to_string()))
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Converts between stored UTC instants and the operator's wall clock.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// `"auto"` selects the system timezone. Unrecognised names fall back to
    /// UTC and log a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = if tz_name == "auto" {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { tz }
    }

    pub fn from_tz(tz: Tz) -> Self {
        Self { tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Resolve a wall-clock time to an instant.
    ///
    /// A time inside a DST gap is read with the offset in force before the
    /// gap, which moves it forward by the gap length. An ambiguous time
    /// resolves to the earlier instant.
    pub fn resolve_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let before = self
                    .tz
                    .offset_from_utc_datetime(&(naive - Duration::days(1)))
                    .fix();
                let utc = naive - Duration::seconds(i64::from(before.local_minus_utc()));
                Utc.from_utc_datetime(&utc)
            }
        }
    }

    /// Local calendar date of `instant`.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Local wall-clock time of `instant`.
    pub fn local_datetime(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// First instant of `date` in local time.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(NaiveTime::MIN))
    }

    /// 23:59:59 local time on `date`.
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(NaiveTime::MIN) + Duration::seconds(END_OF_DAY_SECS))
    }

    /// Inclusive `[from, to]` range of a local calendar day: local midnight
    /// through the last millisecond before the next local midnight. Spans 23
    /// or 25 hours on DST change days.
    pub fn day_range(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start_of_day(date);
        let to = date.succ_opt().map_or_else(
            || self.end_of_day(date),
            |next| self.start_of_day(next) - Duration::milliseconds(1),
        );
        (from, to)
    }

    /// Today's date on the local wall clock.
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    // ── Month buckets ─────────────────────────────────────────────────────────

    /// Month bucket for the local month that contains `date`.
    pub fn month_bucket(&self, date: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(first_day_of_month(date))
    }

    /// Normalize any instant to the bucket of its local calendar month.
    pub fn month_start_of(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.month_bucket(self.local_date(instant))
    }

    /// Inclusive `[from, to]` range of a month: local midnight on day 1 through
    /// 23:59:59 on the last day.
    pub fn month_range(&self, month_start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let local = self.local_date(month_start);
        let from = self.start_of_day(first_day_of_month(local));
        let to = self.end_of_day(last_day_of_month(local));
        (from, to)
    }

    /// Bucket `offset` months away from the month containing `month_start`.
    pub fn shift_month(&self, month_start: DateTime<Utc>, offset: i32) -> DateTime<Utc> {
        let first = first_day_of_month(self.local_date(month_start));
        let months = Months::new(offset.unsigned_abs());
        let shifted = if offset >= 0 {
            first.checked_add_months(months)
        } else {
            first.checked_sub_months(months)
        };
        self.month_bucket(shifted.unwrap_or(first))
    }

    pub fn previous_month(&self, month_start: DateTime<Utc>) -> DateTime<Utc> {
        self.shift_month(month_start, -1)
    }

    /// Whether analytics may be built for `month_start`: the month must have
    /// fully elapsed relative to `today`.
    pub fn can_build(&self, month_start: DateTime<Utc>, today: NaiveDate) -> bool {
        month_start < self.month_bucket(today)
    }

    /// `"YYYY-MM"` label of the local month containing `instant`.
    pub fn month_key(&self, instant: DateTime<Utc>) -> String {
        self.local_date(instant).format("%Y-%m").to_string()
    }
}

// ── format_display_time ───────────────────────────────────────────────────────

/// Format a local time as `"14:30"` or, with `use_12h`, `"02:30 PM"`.
pub fn format_display_time(dt: &DateTime<Tz>, use_12h: bool) -> String {
    if use_12h {
        dt.format("%I:%M %p").to_string()
    } else {
        dt.format("%H:%M").to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
