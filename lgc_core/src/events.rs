//! Progress and log events produced by an import run.
//!
//! The engine never formats output itself; it hands each event to an
//! [`ImportObserver`]. Every event renders as one human-readable log line.

use crate::extract::FileFormat;
use crate::reconcile::{ConflictAction, ImportConflict};
use std::fmt;

/// One discrete step of an import run
#[derive(Clone, Debug, PartialEq)]
pub enum ImportEvent {
    Reading { file_name: String },
    RowsFound(usize),
    FormatDetected(FileFormat),
    UnknownFormat,
    RecordsExtracted { format: FileFormat, count: usize },
    ConflictsFound(usize),
    Conflict(ImportConflict),
    CheckinsMerged(usize),
    /// Overall completion, 0..=100
    Progress(u8),
    BatchCommitted { batch: usize, records: usize },
    BatchFailed { batch: usize, message: String },
    Cancelled,
    Failed(String),
    Completed { format: FileFormat, imported: usize },
}

impl ImportEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, ImportEvent::BatchFailed { .. } | ImportEvent::Failed(_))
    }
}

impl fmt::Display for ImportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportEvent::Reading { file_name } => write!(f, "Reading {}...", file_name),
            ImportEvent::RowsFound(n) => write!(f, "Found {} rows", n),
            ImportEvent::FormatDetected(FileFormat::Workout) => write!(f, "Detected workout file"),
            ImportEvent::FormatDetected(FileFormat::Measurement) => {
                write!(f, "Detected measurement file")
            }
            ImportEvent::UnknownFormat => write!(f, "Unknown file format, skipping"),
            ImportEvent::RecordsExtracted {
                format: FileFormat::Workout,
                count,
            } => write!(f, "Found {} unique workout entries", count),
            ImportEvent::RecordsExtracted {
                format: FileFormat::Measurement,
                count,
            } => write!(f, "Found {} measurement days", count),
            ImportEvent::ConflictsFound(n) => {
                write!(f, "Found {} entries that already exist", n)
            }
            ImportEvent::Conflict(c) => {
                let verdict = match c.action {
                    ConflictAction::Keep => "keep existing",
                    ConflictAction::Replace => "replace",
                };
                write!(
                    f,
                    "{} {}: existing e1RM {} vs imported {} -> {}",
                    c.date, c.exercise, c.existing_e1rm, c.incoming_e1rm, verdict
                )
            }
            ImportEvent::CheckinsMerged(n) => {
                write!(f, "Merged {} days with existing check-ins", n)
            }
            ImportEvent::Progress(p) => write!(f, "{}%", p),
            ImportEvent::BatchCommitted { batch, records } => {
                write!(f, "Batch {} saved ({} records)", batch, records)
            }
            ImportEvent::BatchFailed { batch, message } => {
                write!(f, "Batch {} error: {}", batch, message)
            }
            ImportEvent::Cancelled => write!(f, "Import cancelled, nothing was saved"),
            ImportEvent::Failed(message) => write!(f, "Error: {}", message),
            ImportEvent::Completed {
                format: FileFormat::Workout,
                imported,
            } => write!(f, "Imported {} workout entries", imported),
            ImportEvent::Completed {
                format: FileFormat::Measurement,
                imported,
            } => write!(f, "Imported {} check-in entries", imported),
        }
    }
}

/// Receiver of import events
pub trait ImportObserver {
    fn on_event(&mut self, event: &ImportEvent);
}

/// Collects every event, in order
impl ImportObserver for Vec<ImportEvent> {
    fn on_event(&mut self, event: &ImportEvent) {
        self.push(event.clone());
    }
}

/// Forwards events to `tracing`
///
/// Progress goes to debug, failures to warn/error, everything else to info.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_event(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Progress(_) => tracing::debug!("{}", event),
            ImportEvent::UnknownFormat | ImportEvent::BatchFailed { .. } => {
                tracing::warn!("{}", event)
            }
            ImportEvent::Failed(_) => tracing::error!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}
