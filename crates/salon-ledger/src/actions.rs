//! `--action add|edit|delete` on appointments, report entries and clients.
//!
//! The record kind follows `--view`. Field flags that are not given keep the
//! stored value on edit; an empty string clears an optional field.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::error::LedgerError;
use ledger_core::formatting::parse_money;
use ledger_core::models::{Appointment, Client, FinancialEntry, ReportType};
use ledger_core::settings::Settings;
use ledger_core::time_utils::{parse_local_datetime, parse_month, TimezoneHandler};
use ledger_data::store::JsonlStore;
use serde::Serialize;
use serde_json::json;

pub fn run_action(
    action: &str,
    settings: &Settings,
    store: &JsonlStore,
    tz: &TimezoneHandler,
    now: DateTime<Utc>,
) -> Result<String> {
    match settings.view.as_str() {
        "schedule" => appointment_action(action, settings, store, tz),
        "reports" => report_action(action, settings, store, tz, tz.local_date(now)),
        "clients" => client_action(action, settings, store, now),
        other => bail!("--action is not available for the {other} view"),
    }
}

// ── Appointments ──────────────────────────────────────────────────────────────

fn appointment_action(
    action: &str,
    settings: &Settings,
    store: &JsonlStore,
    tz: &TimezoneHandler,
) -> Result<String> {
    let mut appointment = match action {
        "delete" => {
            let id = required_id(settings)?;
            store.delete_appointment(id)?;
            return Ok(deleted(settings, "appointment", id));
        }
        "add" => {
            let start = settings
                .start
                .as_deref()
                .context("--start is required to add an appointment")?;
            let end = settings
                .end
                .as_deref()
                .context("--end is required to add an appointment")?;
            Appointment {
                id: 0,
                client_id: settings
                    .client_id
                    .context("--client-id is required to add an appointment")?,
                date_start: local_instant(start, tz)?,
                date_end: local_instant(end, tz)?,
                income: None,
                expense: None,
                note: None,
            }
        }
        _ => {
            let id = required_id(settings)?;
            store.appointment(id)?.ok_or(LedgerError::NotFound {
                kind: "appointment",
                id,
            })?
        }
    };

    if let Some(client_id) = settings.client_id {
        appointment.client_id = client_id;
    }
    if let Some(start) = settings.start.as_deref() {
        appointment.date_start = local_instant(start, tz)?;
    }
    if let Some(end) = settings.end.as_deref() {
        appointment.date_end = local_instant(end, tz)?;
    }
    if let Some(income) = settings.income.as_deref() {
        appointment.income = optional_money(income)?;
    }
    if let Some(expense) = settings.expense.as_deref() {
        appointment.expense = optional_money(expense)?;
    }
    if let Some(note) = settings.note.as_deref() {
        appointment.note = optional_text(note);
    }

    if store.client(appointment.client_id)?.is_none() {
        return Err(LedgerError::NotFound {
            kind: "client",
            id: appointment.client_id,
        }
        .into());
    }

    let saved = store.book_appointment(appointment, tz)?;
    tracing::info!(id = saved.id, action, "appointment saved");
    let when = tz.local_datetime(saved.date_start).format("%Y-%m-%d %H:%M");
    saved_output(settings, &saved, format!("Saved appointment #{} at {when}", saved.id))
}

// ── Report entries ────────────────────────────────────────────────────────────

fn report_action(
    action: &str,
    settings: &Settings,
    store: &JsonlStore,
    tz: &TimezoneHandler,
    today: NaiveDate,
) -> Result<String> {
    let mut entry = match action {
        "delete" => {
            let id = required_id(settings)?;
            store.delete_report(id)?;
            return Ok(deleted(settings, "report", id));
        }
        "add" => FinancialEntry {
            id: 0,
            month_start: tz.month_bucket(today),
            kind: report_kind(
                settings
                    .kind
                    .as_deref()
                    .context("--kind is required to add a report entry")?,
            )?,
            label: settings
                .label
                .clone()
                .context("--label is required to add a report entry")?,
            amount: parse_money(
                settings
                    .amount
                    .as_deref()
                    .context("--amount is required to add a report entry")?,
            )?,
        },
        _ => {
            let id = required_id(settings)?;
            store
                .report(id)?
                .ok_or(LedgerError::NotFound { kind: "report", id })?
        }
    };

    if let Some(month) = settings.month.as_deref() {
        entry.month_start = tz.month_bucket(parse_month(month)?);
    }
    if let Some(kind) = settings.kind.as_deref() {
        entry.kind = report_kind(kind)?;
    }
    if let Some(label) = settings.label.as_deref() {
        entry.label = label.trim().to_string();
    }
    if let Some(amount) = settings.amount.as_deref() {
        entry.amount = parse_money(amount)?;
    }

    let saved = store.save_report(entry)?;
    tracing::info!(id = saved.id, action, "report entry saved");
    let month = tz.month_key(saved.month_start);
    saved_output(settings, &saved, format!("Saved report #{} for {month}", saved.id))
}

fn report_kind(s: &str) -> Result<ReportType> {
    match s {
        "income" => Ok(ReportType::Income),
        "expense" => Ok(ReportType::Expense),
        other => bail!("Unknown report kind: {other}"),
    }
}

// ── Clients ───────────────────────────────────────────────────────────────────

fn client_action(
    action: &str,
    settings: &Settings,
    store: &JsonlStore,
    now: DateTime<Utc>,
) -> Result<String> {
    let id = match action {
        "delete" => {
            let id = required_id(settings)?;
            store.delete_client(id)?;
            return Ok(deleted(settings, "client", id));
        }
        "add" => {
            let name = settings
                .name
                .as_deref()
                .context("--name is required to add a client")?;
            store.create_client(name, settings.phone.as_deref(), now)?
        }
        _ => required_id(settings)?,
    };

    let mut client: Client = store
        .client(id)?
        .ok_or(LedgerError::NotFound { kind: "client", id })?;
    if action == "edit" {
        if let Some(name) = settings.name.as_deref() {
            client.name = name.trim().to_string();
        }
        if let Some(phone) = settings.phone.as_deref() {
            client.phone = optional_text(phone);
        }
    }
    if let Some(notes) = settings.notes.as_deref() {
        client.notes = optional_text(notes);
    }

    let saved = store.save_client(client)?;
    tracing::info!(id = saved.id, action, "client saved");
    saved_output(settings, &saved, format!("Saved client #{} {}", saved.id, saved.name))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn required_id(settings: &Settings) -> Result<i64> {
    settings.id.context("--id is required to edit or delete a record")
}

fn local_instant(s: &str, tz: &TimezoneHandler) -> Result<DateTime<Utc>> {
    Ok(tz.resolve_local(parse_local_datetime(s)?))
}

fn optional_money(s: &str) -> Result<Option<i64>> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(parse_money(s)?))
}

fn optional_text(s: &str) -> Option<String> {
    Some(s.trim()).filter(|t| !t.is_empty()).map(str::to_string)
}

fn saved_output<T: Serialize>(settings: &Settings, record: &T, text: String) -> Result<String> {
    if settings.json_output() {
        Ok(serde_json::to_string_pretty(record)?)
    } else {
        Ok(text)
    }
}

fn deleted(settings: &Settings, kind: &str, id: i64) -> String {
    tracing::info!(id, kind, "record deleted");
    if settings.json_output() {
        json!({ "deleted": kind, "id": id }).to_string()
    } else {
        format!("Deleted {kind} #{id}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
