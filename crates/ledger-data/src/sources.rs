//! Read-side collaborators of the aggregator.
//!
//! The aggregator never talks to storage directly; it is handed an
//! [`AppointmentReader`] and a [`ReportReader`]. [`MemoryStore`] implements
//! both over plain vectors.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{Appointment, FinancialEntry};
use ledger_core::time_utils::TimezoneHandler;

// ── Traits ────────────────────────────────────────────────────────────────────

/// Source of appointments.
pub trait AppointmentReader: Send + Sync {
    /// All appointments with `date_start` in `[from, to]` (inclusive), ordered
    /// by `date_start`.
    fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>>;
}

/// Source of ad-hoc financial entries.
pub trait ReportReader: Send + Sync {
    /// All entries whose `month_start` equals `month_start` exactly, newest
    /// id first.
    fn by_month(&self, month_start: DateTime<Utc>) -> Result<Vec<FinancialEntry>>;
}

impl<T: AppointmentReader + ?Sized> AppointmentReader for Arc<T> {
    fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>> {
        (**self).between(from, to)
    }
}

impl<T: ReportReader + ?Sized> ReportReader for Arc<T> {
    fn by_month(&self, month_start: DateTime<Utc>) -> Result<Vec<FinancialEntry>> {
        (**self).by_month(month_start)
    }
}

/// Appointments on one local calendar day, from local midnight through the
/// last millisecond before the next local midnight.
pub fn appointments_for_day<R: AppointmentReader + ?Sized>(
    reader: &R,
    tz: &TimezoneHandler,
    date: NaiveDate,
) -> Result<Vec<Appointment>> {
    let (start, end) = tz.day_range(date);
    reader.between(start, end)
}

/// Filter and order appointments the way every [`AppointmentReader`] must.
pub(crate) fn select_between(
    appointments: &[Appointment],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<Appointment> {
    let mut selected: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.date_start >= from && a.date_start <= to)
        .cloned()
        .collect();
    selected.sort_by_key(|a| a.date_start);
    selected
}

/// Filter and order entries the way every [`ReportReader`] must.
pub(crate) fn select_month(
    entries: &[FinancialEntry],
    month_start: DateTime<Utc>,
) -> Vec<FinancialEntry> {
    let mut selected: Vec<FinancialEntry> = entries
        .iter()
        .filter(|e| e.month_start == month_start)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.id.cmp(&a.id));
    selected
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// In-memory snapshot of appointments and entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    appointments: RwLock<Vec<Appointment>>,
    reports: RwLock<Vec<FinancialEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(appointments: Vec<Appointment>, reports: Vec<FinancialEntry>) -> Self {
        Self {
            appointments: RwLock::new(appointments),
            reports: RwLock::new(reports),
        }
    }

    pub fn push_appointment(&self, appointment: Appointment) -> Result<()> {
        self.appointments
            .write()
            .map_err(|e| LedgerError::unavailable("memory appointments", e))?
            .push(appointment);
        Ok(())
    }

    pub fn push_report(&self, entry: FinancialEntry) -> Result<()> {
        self.reports
            .write()
            .map_err(|e| LedgerError::unavailable("memory reports", e))?
            .push(entry);
        Ok(())
    }
}

impl AppointmentReader for MemoryStore {
    fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>> {
        let guard = self
            .appointments
            .read()
            .map_err(|e| LedgerError::unavailable("memory appointments", e))?;
        Ok(select_between(&guard, from, to))
    }
}

impl ReportReader for MemoryStore {
    fn by_month(&self, month_start: DateTime<Utc>) -> Result<Vec<FinancialEntry>> {
        let guard = self
            .reports
            .read()
            .map_err(|e| LedgerError::unavailable("memory reports", e))?;
        Ok(select_month(&guard, month_start))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
