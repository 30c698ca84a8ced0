mod actions;
mod bootstrap;
mod views;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use ledger_core::formatting::format_month_title;
use ledger_core::settings::Settings;
use ledger_core::time_utils::{parse_date, parse_month, TimezoneHandler};
use ledger_data::aggregator::MonthlyAggregator;
use ledger_data::sources::{appointments_for_day, ReportReader};
use ledger_data::store::JsonlStore;
use ledger_runtime::analytics_session::AnalyticsSession;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    if let Err(e) = settings.persist_last_used() {
        tracing::warn!(error = %e, "could not persist last-used parameters");
    }

    tracing::info!("Salon Ledger v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Timezone: {}, Format: {}",
        settings.view,
        settings.timezone,
        settings.format
    );

    let tz = TimezoneHandler::new(&settings.timezone);
    let data_dir = bootstrap::resolve_data_dir(settings.data_dir.as_deref());
    let store = Arc::new(
        JsonlStore::open(data_dir.clone())
            .with_context(|| format!("opening data directory {}", data_dir.display()))?,
    );
    let today = tz.today();

    if let Some(action) = settings.action.as_deref() {
        let output = actions::run_action(action, &settings, &store, &tz, Utc::now())?;
        println!("{output}");
        return Ok(());
    }

    let output = match settings.view.as_str() {
        "analytics" => run_analytics(&settings, store, tz, today).await?,
        "reports" => run_reports(&settings, &store, &tz, today)?,
        "schedule" => run_schedule(&settings, &store, &tz, today)?,
        "clients" => run_clients(&settings, &store, &tz)?,
        unknown => bail!("Unknown view: {unknown}"),
    };

    println!("{output}");
    Ok(())
}

// ── Views ─────────────────────────────────────────────────────────────────────

async fn run_analytics(
    settings: &Settings,
    store: Arc<JsonlStore>,
    tz: TimezoneHandler,
    today: NaiveDate,
) -> Result<String> {
    // The last complete month unless one is asked for.
    let month = match settings.month.as_deref() {
        Some(m) => tz.month_bucket(parse_month(m)?),
        None => tz.previous_month(tz.month_bucket(today)),
    };

    let aggregator = MonthlyAggregator::new(store.clone(), store, tz);
    let mut session = AnalyticsSession::new(aggregator, today);
    session.select_month(month);

    if !session.can_build(today) && !settings.force {
        bail!(
            "{} has not finished yet; pass --force to build analytics anyway",
            format_month_title(tz.local_date(month))
        );
    }

    let result = session.build().await?;
    if settings.json_output() {
        Ok(serde_json::to_string_pretty(&views::analytics_json(
            &result, &tz,
        ))?)
    } else {
        Ok(views::analytics_text(&result, &tz, &settings.currency))
    }
}

fn run_reports(
    settings: &Settings,
    store: &JsonlStore,
    tz: &TimezoneHandler,
    today: NaiveDate,
) -> Result<String> {
    let month = match settings.month.as_deref() {
        Some(m) => tz.month_bucket(parse_month(m)?),
        None => tz.month_bucket(today),
    };
    let entries = store.by_month(month)?;
    tracing::debug!(
        month = %tz.month_key(month),
        entries = entries.len(),
        "loaded reports"
    );

    if settings.json_output() {
        Ok(serde_json::to_string_pretty(&entries)?)
    } else {
        Ok(views::reports_text(month, &entries, tz, &settings.currency))
    }
}

fn run_schedule(
    settings: &Settings,
    store: &JsonlStore,
    tz: &TimezoneHandler,
    today: NaiveDate,
) -> Result<String> {
    let date = match settings.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => today,
    };
    let appointments = appointments_for_day(store, tz, date)?;

    if settings.json_output() {
        return Ok(serde_json::to_string_pretty(&appointments)?);
    }

    let names: HashMap<i64, String> = store
        .clients()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    Ok(views::schedule_text(
        date,
        &appointments,
        &names,
        tz,
        settings.use_12h(),
        &settings.currency,
    ))
}

fn run_clients(settings: &Settings, store: &JsonlStore, tz: &TimezoneHandler) -> Result<String> {
    let clients = store.clients()?;
    if settings.json_output() {
        Ok(serde_json::to_string_pretty(&clients)?)
    } else {
        Ok(views::clients_text(&clients, tz))
    }
}
