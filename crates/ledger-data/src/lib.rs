//! Data layer for Salon Ledger.
//!
//! Reader traits for appointments and financial entries, an in-memory and a
//! JSONL-file implementation of them, and the monthly analytics aggregator
//! built on top.

pub mod aggregator;
pub mod sources;
pub mod store;

pub use ledger_core as core;
