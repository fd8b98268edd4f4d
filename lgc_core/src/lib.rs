#![forbid(unsafe_code)]

//! Core domain model and import logic for Lazy Gains Club.
//!
//! This crate provides:
//! - Domain types (workouts, sets, check-ins)
//! - Strength and body-composition formulas
//! - Export file parsing and record extraction
//! - The import reconciliation engine and its event stream
//! - Manual workout and check-in logging
//! - Record storage (JSON Lines, in-memory)
//! - Dashboard and score history summaries, CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod formula;
pub mod csv_line;
pub mod extract;
pub mod events;
pub mod store;
pub mod reconcile;
pub mod entry;
pub mod summary;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use formula::{body_fat, e1rm, lgc_score};
pub use extract::FileFormat;
pub use events::{ImportEvent, ImportObserver, TracingObserver};
pub use store::{JsonlStore, MemoryStore, RecordStore, StoredRecord};
pub use reconcile::{
    ConflictAction, ConflictResolver, Decision, ImportConflict, ImportOutcome, ImportSummary,
    Importer,
};
pub use summary::{score_history, Dashboard, MonthlyScore};
pub use entry::{log_checkin, log_workout, CheckinEntry, DayTemplate, SetInput};
