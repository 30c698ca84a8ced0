//! Runtime layer for Salon Ledger.
//!
//! Drives the aggregator from async code: month selection, parallel fetches on
//! the blocking pool and a short-lived result cache.

pub mod analytics_session;

pub use ledger_core as core;
pub use ledger_data as data;
