//! JSONL-backed store for clients, appointments and financial entries.
//!
//! Each record type lives in its own file under the data directory, one JSON
//! object per line. Missing files read as empty. Lines that fail to parse are
//! skipped. Every write rewrites the whole file through a temp file and a
//! rename.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{Appointment, Client, FinancialEntry};
use ledger_core::time_utils::TimezoneHandler;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::sources::{select_between, select_month, AppointmentReader, ReportReader};

pub const APPOINTMENTS_FILE: &str = "appointments.jsonl";
pub const REPORTS_FILE: &str = "reports.jsonl";
pub const CLIENTS_FILE: &str = "clients.jsonl";

/// Record types persisted by [`JsonlStore`], keyed by an integer id.
trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: &'static str;
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    /// Why the record must not be stored, if anything.
    fn problem(&self) -> Option<&'static str>;
}

impl Record for Appointment {
    const KIND: &'static str = "appointment";
    fn id(&self) -> i64 {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
    fn problem(&self) -> Option<&'static str> {
        if self.date_end < self.date_start {
            Some("end is before start")
        } else if self.income.is_some_and(|v| v < 0) {
            Some("income must not be negative")
        } else if self.expense.is_some_and(|v| v < 0) {
            Some("expense must not be negative")
        } else {
            None
        }
    }
}

impl Record for FinancialEntry {
    const KIND: &'static str = "report";
    fn id(&self) -> i64 {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
    fn problem(&self) -> Option<&'static str> {
        (self.amount < 0).then_some("amount must not be negative")
    }
}

impl Record for Client {
    const KIND: &'static str = "client";
    fn id(&self) -> i64 {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
    fn problem(&self) -> Option<&'static str> {
        self.name.trim().is_empty().then_some("name must not be empty")
    }
}

// ── JsonlStore ────────────────────────────────────────────────────────────────

/// File store rooted at a data directory.
#[derive(Debug)]
pub struct JsonlStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open (and create if needed) a store in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| LedgerError::FileRead {
            path: dir.clone(),
            source,
        })?;
        debug!("Opened ledger store at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Appointments ──────────────────────────────────────────────────────────

    /// Every stored appointment, ordered by start.
    pub fn appointments(&self) -> Result<Vec<Appointment>> {
        let mut all: Vec<Appointment> = self.read_all(APPOINTMENTS_FILE)?;
        all.sort_by_key(|a| a.date_start);
        Ok(all)
    }

    /// Insert when `id == 0`, otherwise replace the stored record. Returns the
    /// saved appointment with its id.
    pub fn save_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        self.save(APPOINTMENTS_FILE, appointment)
    }

    pub fn appointment(&self, id: i64) -> Result<Option<Appointment>> {
        self.find(APPOINTMENTS_FILE, id)
    }

    /// [`save_appointment`](Self::save_appointment), refused with
    /// [`LedgerError::Conflict`] when the new time overlaps another
    /// appointment on the same local day.
    pub fn book_appointment(
        &self,
        appointment: Appointment,
        tz: &TimezoneHandler,
    ) -> Result<Appointment> {
        let (start, end) = (appointment.date_start, appointment.date_end);
        if self.has_conflicts(start, end, appointment.id, tz)? {
            let local = tz.local_datetime(start).format("%Y-%m-%d %H:%M");
            warn!(%local, "appointment overlaps an existing one");
            return Err(LedgerError::Conflict(format!(
                "{local} overlaps another appointment"
            )));
        }
        self.save_appointment(appointment)
    }

    pub fn delete_appointment(&self, id: i64) -> Result<()> {
        self.delete::<Appointment>(APPOINTMENTS_FILE, id)
    }

    /// Whether another appointment on the same local day overlaps
    /// `[start, end)`. The appointment with `exclude_id` is ignored so an
    /// edit does not conflict with itself.
    pub fn has_conflicts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: i64,
        tz: &TimezoneHandler,
    ) -> Result<bool> {
        let (day_start, day_end) = tz.day_range(tz.local_date(start));

        let conflict = self
            .between(day_start, day_end)?
            .iter()
            .any(|a| a.id != exclude_id && a.date_start < end && a.date_end > start);
        Ok(conflict)
    }

    // ── Reports ───────────────────────────────────────────────────────────────

    pub fn save_report(&self, entry: FinancialEntry) -> Result<FinancialEntry> {
        self.save(REPORTS_FILE, entry)
    }

    pub fn report(&self, id: i64) -> Result<Option<FinancialEntry>> {
        self.find(REPORTS_FILE, id)
    }

    pub fn delete_report(&self, id: i64) -> Result<()> {
        self.delete::<FinancialEntry>(REPORTS_FILE, id)
    }

    // ── Clients ───────────────────────────────────────────────────────────────

    /// All clients ordered by name.
    pub fn clients(&self) -> Result<Vec<Client>> {
        let mut all: Vec<Client> = self.read_all(CLIENTS_FILE)?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    pub fn client(&self, id: i64) -> Result<Option<Client>> {
        self.find(CLIENTS_FILE, id)
    }

    /// Create a client from form input and return its id.
    ///
    /// The name is trimmed; a blank phone is stored as `None`. The visit time
    /// is set to `now`.
    pub fn create_client(&self, name: &str, phone: Option<&str>, now: DateTime<Utc>) -> Result<i64> {
        let client = Client {
            id: 0,
            name: name.trim().to_string(),
            phone: phone
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            last_visit: Some(now),
            notes: None,
        };
        Ok(self.save(CLIENTS_FILE, client)?.id)
    }

    pub fn save_client(&self, client: Client) -> Result<Client> {
        self.save(CLIENTS_FILE, client)
    }

    /// Remove a client. Their appointments are kept.
    pub fn delete_client(&self, id: i64) -> Result<()> {
        self.delete::<Client>(CLIENTS_FILE, id)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_all<T: Record>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let handle = std::fs::File::open(&path).map_err(|source| LedgerError::FileRead {
            path: path.clone(),
            source,
        })?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line_no, line) in std::io::BufReader::new(handle).lines().enumerate() {
            let line = line.map_err(|source| LedgerError::FileRead {
                path: path.clone(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(trimmed) {
                Ok(record) => match record.problem() {
                    None => records.push(record),
                    Some(reason) => {
                        skipped += 1;
                        debug!(
                            "Skipping line {} of {}: invalid {}: {}",
                            line_no + 1,
                            path.display(),
                            T::KIND,
                            reason
                        );
                    }
                },
                Err(e) => {
                    skipped += 1;
                    debug!(
                        "Skipping line {} of {}: {}",
                        line_no + 1,
                        path.display(),
                        e
                    );
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, file = %path.display(), "ignored unparseable records");
        }
        Ok(records)
    }

    fn write_all<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let path = self.path(file);
        let tmp = path.with_extension("jsonl.tmp");

        let mut out = std::io::BufWriter::new(std::fs::File::create(&tmp)?);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        drop(out);

        std::fs::rename(&tmp, &path)?;
        debug!(records = records.len(), file = %path.display(), "store file rewritten");
        Ok(())
    }

    fn find<T: Record>(&self, file: &str, id: i64) -> Result<Option<T>> {
        let all: Vec<T> = self.read_all(file)?;
        Ok(all.into_iter().find(|r| r.id() == id))
    }

    fn save<T: Record>(&self, file: &str, mut record: T) -> Result<T> {
        if let Some(reason) = record.problem() {
            return Err(LedgerError::InvalidRecord {
                kind: T::KIND,
                reason: reason.to_string(),
            });
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| LedgerError::unavailable(file, e))?;

        let mut all: Vec<T> = self.read_all(file)?;
        if record.id() == 0 {
            let next = all.iter().map(Record::id).max().unwrap_or(0) + 1;
            record.set_id(next);
            all.push(record.clone());
        } else {
            let slot = all
                .iter_mut()
                .find(|r| r.id() == record.id())
                .ok_or(LedgerError::NotFound {
                    kind: T::KIND,
                    id: record.id(),
                })?;
            *slot = record.clone();
        }

        self.write_all(file, &all)?;
        Ok(record)
    }

    fn delete<T: Record>(&self, file: &str, id: i64) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| LedgerError::unavailable(file, e))?;

        let mut all: Vec<T> = self.read_all(file)?;
        let before = all.len();
        all.retain(|r| r.id() != id);
        if all.len() == before {
            return Err(LedgerError::NotFound { kind: T::KIND, id });
        }
        self.write_all(file, &all)
    }
}

impl AppointmentReader for JsonlStore {
    fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>> {
        let all: Vec<Appointment> = self
            .read_all(APPOINTMENTS_FILE)
            .map_err(|e| LedgerError::unavailable(APPOINTMENTS_FILE, e))?;
        Ok(select_between(&all, from, to))
    }
}

impl ReportReader for JsonlStore {
    fn by_month(&self, month_start: DateTime<Utc>) -> Result<Vec<FinancialEntry>> {
        let all: Vec<FinancialEntry> = self
            .read_all(REPORTS_FILE)
            .map_err(|e| LedgerError::unavailable(REPORTS_FILE, e))?;
        Ok(select_month(&all, month_start))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
