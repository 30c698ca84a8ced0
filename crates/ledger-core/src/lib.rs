//! Shared building blocks for Salon Ledger.
//!
//! Domain models, the error type, calendar math in the operator's local
//! time zone, display calculations, money formatting and CLI settings.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{LedgerError, Result};
