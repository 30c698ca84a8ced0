//! Month selection and on-demand analytics building.
//!
//! [`AnalyticsSession`] keeps the month the operator is looking at and turns
//! it into an [`AnalyticsResult`] when asked. The current and previous months
//! are summarized in parallel on tokio's blocking pool, since readers may hit
//! the filesystem. Per-month summaries can be cached for a short TTL; the
//! comparison is always recomputed from them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use ledger_core::error::{LedgerError, Result};
use ledger_core::models::AnalyticsResult;
use ledger_data::aggregator::{compare_months, MonthlyAggregator};

// ── AnalyticsSession ──────────────────────────────────────────────────────────

struct CachedMonth {
    summary: AnalyticsResult,
    fetched_at: Instant,
}

/// Selected month plus the last analytics built for it.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ledger_core::time_utils::TimezoneHandler;
/// use ledger_data::aggregator::MonthlyAggregator;
/// use ledger_data::sources::MemoryStore;
/// use ledger_runtime::analytics_session::AnalyticsSession;
///
/// # async fn run() -> ledger_core::Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// let tz = TimezoneHandler::new("auto");
/// let today = tz.today();
/// let mut session = AnalyticsSession::new(MonthlyAggregator::new(store.clone(), store, tz), today);
/// session.change_month(-1);
/// if session.can_build(today) {
///     let result = session.build().await?;
///     println!("profit: {}", result.profit());
/// }
/// # Ok(())
/// # }
/// ```
pub struct AnalyticsSession {
    aggregator: MonthlyAggregator,
    selected: DateTime<Utc>,
    /// `None` disables caching.
    cache_ttl: Option<Duration>,
    cache: HashMap<DateTime<Utc>, CachedMonth>,
    last_result: Option<AnalyticsResult>,
}

impl AnalyticsSession {
    /// Start on the month containing `today`, without caching.
    pub fn new(aggregator: MonthlyAggregator, today: NaiveDate) -> Self {
        let selected = aggregator.timezone().month_bucket(today);
        Self {
            aggregator,
            selected,
            cache_ttl: None,
            cache: HashMap::new(),
            last_result: None,
        }
    }

    /// Keep month summaries for `ttl_secs` seconds between builds.
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl = Some(Duration::from_secs(ttl_secs));
        self
    }

    // ── Month selection ───────────────────────────────────────────────────

    pub fn selected_month(&self) -> DateTime<Utc> {
        self.selected
    }

    /// Move the selection `offset` months forward (negative: backward).
    ///
    /// Any previously built result belongs to the old month and is dropped.
    pub fn change_month(&mut self, offset: i32) {
        self.selected = self.aggregator.timezone().shift_month(self.selected, offset);
        self.last_result = None;
        tracing::debug!(
            month = %self.aggregator.timezone().month_key(self.selected),
            offset,
            "selected month changed"
        );
    }

    /// Jump to the month containing `instant`.
    pub fn select_month(&mut self, instant: DateTime<Utc>) {
        let bucket = self.aggregator.timezone().month_start_of(instant);
        if bucket != self.selected {
            self.selected = bucket;
            self.last_result = None;
        }
    }

    /// Whether the selected month has fully elapsed relative to `today`.
    pub fn can_build(&self, today: NaiveDate) -> bool {
        self.aggregator.timezone().can_build(self.selected, today)
    }

    // ── Building ──────────────────────────────────────────────────────────

    /// Build analytics for the selected month against the month before it.
    ///
    /// Does not check [`can_build`](Self::can_build); callers gate on it.
    /// The session is only updated once both months are in, so dropping the
    /// returned future leaves it untouched.
    pub async fn build(&mut self) -> Result<AnalyticsResult> {
        let current_month = self.selected;
        let previous_month = self.aggregator.timezone().previous_month(current_month);

        let (current, previous) = tokio::try_join!(
            self.summary_for(current_month),
            self.summary_for(previous_month)
        )?;

        self.store_summary(&current);
        self.store_summary(&previous);

        let result = compare_months(current, &previous);
        tracing::info!(
            month = %self.aggregator.timezone().month_key(current_month),
            income = result.total_income(),
            expense = result.total_expense(),
            records = result.records_count,
            "analytics built"
        );
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// The result of the last successful [`build`](Self::build) for the
    /// selected month.
    pub fn last_result(&self) -> Option<&AnalyticsResult> {
        self.last_result.as_ref()
    }

    /// Drop every cached month summary, forcing the next build to read.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
        tracing::debug!("analytics cache invalidated");
    }

    // ── Private helpers ───────────────────────────────────────────────────

    async fn summary_for(&self, month_start: DateTime<Utc>) -> Result<AnalyticsResult> {
        if let Some(hit) = self.cached(month_start) {
            tracing::debug!(
                month = %self.aggregator.timezone().month_key(month_start),
                "using cached month summary"
            );
            return Ok(hit);
        }

        let aggregator = self.aggregator.clone();
        tokio::task::spawn_blocking(move || aggregator.summarize_month(month_start))
            .await
            .map_err(|e| LedgerError::unavailable("analytics worker", e))?
    }

    fn cached(&self, month_start: DateTime<Utc>) -> Option<AnalyticsResult> {
        let ttl = self.cache_ttl?;
        self.cache
            .get(&month_start)
            .filter(|c| c.fetched_at.elapsed() < ttl)
            .map(|c| c.summary.clone())
    }

    fn store_summary(&mut self, summary: &AnalyticsResult) {
        if self.cache_ttl.is_none() {
            return;
        }
        let fresh = self.cached(summary.month_start).is_some();
        if !fresh {
            self.cache.insert(
                summary.month_start,
                CachedMonth {
                    summary: summary.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
