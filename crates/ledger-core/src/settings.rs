use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Bookkeeping and monthly analytics for a single-operator salon
#[derive(Parser, Debug, Clone)]
#[command(
    name = "salon-ledger",
    about = "Bookkeeping and monthly analytics for a single-operator salon",
    version
)]
pub struct Settings {
    /// What to show
    #[arg(long, default_value = "analytics", value_parser = ["analytics", "reports", "schedule", "clients"])]
    pub view: String,

    /// Month to analyse or list, as YYYY-MM (defaults to the previous month
    /// for analytics and the current month otherwise)
    #[arg(long)]
    pub month: Option<String>,

    /// Day to show in the schedule view, as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Timezone (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Time format for the schedule view
    #[arg(long, default_value = "24h", value_parser = ["12h", "24h"])]
    pub time_format: String,

    /// Currency symbol appended to amounts
    #[arg(long, default_value = "₽")]
    pub currency: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Directory holding appointments.jsonl, reports.jsonl and clients.jsonl
    #[arg(long, env = "SALON_LEDGER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Build analytics even if the month has not fully elapsed
    #[arg(long)]
    pub force: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    // ── Record editing ────────────────────────────────────────────────────────
    /// Change a record instead of showing the view. The record kind follows
    /// `--view`: schedule edits appointments, reports edits report entries,
    /// clients edits clients.
    #[arg(long, value_parser = ["add", "edit", "delete"])]
    pub action: Option<String>,

    /// Id of the record to edit or delete
    #[arg(long)]
    pub id: Option<i64>,

    /// Client of an appointment
    #[arg(long)]
    pub client_id: Option<i64>,

    /// Appointment start, local time as "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub start: Option<String>,

    /// Appointment end, local time as "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub end: Option<String>,

    /// Income of an appointment, in major units (e.g. 1500.50)
    #[arg(long)]
    pub income: Option<String>,

    /// Expense of an appointment, in major units
    #[arg(long)]
    pub expense: Option<String>,

    /// Free-text note on an appointment
    #[arg(long)]
    pub note: Option<String>,

    /// Kind of a report entry
    #[arg(long, value_parser = ["income", "expense"])]
    pub kind: Option<String>,

    /// Label of a report entry
    #[arg(long)]
    pub label: Option<String>,

    /// Amount of a report entry, in major units
    #[arg(long)]
    pub amount: Option<String>,

    /// Client name
    #[arg(long)]
    pub name: Option<String>,

    /// Client phone; an empty value removes it
    #[arg(long)]
    pub phone: Option<String>,

    /// Client notes; an empty value removes them
    #[arg(long)]
    pub notes: Option<String>,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.salon-ledger/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".salon-ledger").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset options from the last run and resolve
    /// `"auto"` values. Nothing is written; call
    /// [`Settings::persist_last_used`] once logging is up.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        // Saved values are about to be cleared; do not restore them.
        if settings.clear {
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. `view`, `month`, `date` and the record-editing
        // flags are per-invocation and never restored.
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "time_format") {
            if let Some(v) = last.time_format {
                settings.time_format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "currency") {
            if let Some(v) = last.currency {
                settings.currency = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }

        Self::resolve_auto_values(settings)
    }

    /// Save these settings as the last-used parameters, or delete the saved
    /// file when `--clear` was given.
    pub fn persist_last_used(&self) -> Result<(), std::io::Error> {
        self.persist_last_used_to(&LastUsedParams::config_path())
    }

    /// Same as [`Settings::persist_last_used`] with an explicit config path.
    pub fn persist_last_used_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if self.clear {
            LastUsedParams::clear_at(config_path)
        } else {
            LastUsedParams::from(self).save_to(config_path)
        }
    }

    /// Resolve the `"auto"` timezone and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    pub fn use_12h(&self) -> bool {
        self.time_format == "12h"
    }

    pub fn json_output(&self) -> bool {
        self.format == "json"
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            timezone: Some(s.timezone.clone()),
            time_format: Some(s.time_format.clone()),
            currency: Some(s.currency.clone()),
            format: Some(s.format.clone()),
            data_dir: s.data_dir.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
