#![forbid(unsafe_code)]

//! Core domain model and business logic for the Overlog system.
//!
//! This crate provides:
//! - Domain types (log entries, session references, progressions)
//! - The append-only performance ledger
//! - Session-boundary detection over the entry stream
//! - Progressive-overload suggestions
//! - Orchestration service and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod session;
pub mod progression;
pub mod service;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use ledger::{JsonlLedger, LedgerStore};
pub use session::{cluster_sessions, latest_session, threshold_from_hours};
pub use progression::ProgressionRules;
pub use service::ReferenceService;
pub use export::history_to_csv;
