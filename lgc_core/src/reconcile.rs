//! Import reconciliation engine.
//!
//! An import run takes the text of one export file through:
//! 1. Header inspection and record extraction
//! 2. A fetch of the user's existing records of the same kind
//! 3. Reconciliation against that snapshot
//! 4. Confirmation (workouts with conflicts only)
//! 5. Batched upserts
//!
//! Workout imports never lower a stored e1RM: an existing record is only
//! replaced by one with a strictly higher estimate. Check-in imports merge
//! field by field and never erase stored values.

use crate::csv_line::split_lines;
use crate::events::{ImportEvent, ImportObserver};
use crate::extract::{extract_checkins, extract_workouts, FileFormat};
use crate::store::{RecordStore, StoredRecord};
use crate::{CheckinRecord, Exercise, WorkoutKey, WorkoutRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Default number of records per upsert call
pub const DEFAULT_BATCH_SIZE: usize = 50;

// ============================================================================
// Workout conflicts
// ============================================================================

/// What happens to a stored workout record that an import also contains
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAction {
    Keep,
    Replace,
}

/// An incoming workout record whose key is already stored
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ImportConflict {
    pub date: NaiveDate,
    pub exercise: Exercise,
    pub existing_e1rm: u32,
    pub incoming_e1rm: u32,
    pub action: ConflictAction,
}

/// Result of comparing an incoming batch with stored workouts
#[derive(Clone, Debug, Default)]
pub struct WorkoutPlan {
    pub conflicts: Vec<ImportConflict>,
    /// Records to upsert if the plan is committed
    pub writes: Vec<WorkoutRecord>,
    pub new_records: usize,
}

impl WorkoutPlan {
    pub fn replacements(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|c| c.action == ConflictAction::Replace)
            .count()
    }
}

/// Decide keep/replace for every incoming record
///
/// Incoming records without a stored counterpart are always written.
/// Counterparts are replaced only by a strictly higher e1RM.
pub fn plan_workouts(incoming: Vec<WorkoutRecord>, existing: &[WorkoutRecord]) -> WorkoutPlan {
    let index: HashMap<WorkoutKey, &WorkoutRecord> =
        existing.iter().map(|r| (r.key(), r)).collect();

    let mut plan = WorkoutPlan::default();

    for record in incoming {
        match index.get(&record.key()) {
            None => {
                plan.new_records += 1;
                plan.writes.push(record);
            }
            Some(stored) => {
                let action = if record.e1rm > stored.e1rm {
                    ConflictAction::Replace
                } else {
                    ConflictAction::Keep
                };

                plan.conflicts.push(ImportConflict {
                    date: record.date,
                    exercise: record.exercise,
                    existing_e1rm: stored.e1rm,
                    incoming_e1rm: record.e1rm,
                    action,
                });

                if action == ConflictAction::Replace {
                    plan.writes.push(record);
                }
            }
        }
    }

    plan
}

// ============================================================================
// Check-in merge
// ============================================================================

/// Merge an incoming check-in over the stored one for the same day
///
/// Weight and waist are taken from the import when present. Everything else
/// (and any measurement the import lacks) comes from the stored record.
pub fn merge_checkin(existing: Option<&CheckinRecord>, incoming: CheckinRecord) -> CheckinRecord {
    match existing {
        None => incoming,
        Some(stored) => CheckinRecord {
            weight: incoming.weight.or(stored.weight),
            waist: incoming.waist.or(stored.waist),
            ..stored.clone()
        },
    }
}

/// Merge a batch of incoming check-ins against stored ones
///
/// Returns the records to upsert and how many days already existed.
pub fn merge_checkins(
    incoming: Vec<CheckinRecord>,
    existing: &[CheckinRecord],
) -> (Vec<CheckinRecord>, usize) {
    let index: BTreeMap<NaiveDate, &CheckinRecord> =
        existing.iter().map(|c| (c.date, c)).collect();

    let mut merged_days = 0;
    let merged = incoming
        .into_iter()
        .map(|record| {
            let stored = index.get(&record.date).copied();
            if stored.is_some() {
                merged_days += 1;
            }
            merge_checkin(stored, record)
        })
        .collect();

    (merged, merged_days)
}

// ============================================================================
// Confirmation
// ============================================================================

/// Answer to a conflict review
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Commit,
    Cancel,
}

/// Reviews conflicts before anything is written
pub trait ConflictResolver {
    fn resolve(&mut self, conflicts: &[ImportConflict]) -> Decision;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&[ImportConflict]) -> Decision,
{
    fn resolve(&mut self, conflicts: &[ImportConflict]) -> Decision {
        self(conflicts)
    }
}

// ============================================================================
// Import run
// ============================================================================

/// How an import run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Writes were attempted (possibly zero, possibly with failed batches)
    Committed,
    /// Conflict review was declined, nothing written
    Cancelled,
    /// Header not recognised, file ignored
    Skipped,
    /// Existing records could not be read, nothing written
    Aborted(String),
}

/// Caller-visible result of one import run
#[derive(Clone, Debug)]
pub struct ImportSummary {
    pub format: Option<FileFormat>,
    pub rows: usize,
    pub extracted: usize,
    pub conflicts: Vec<ImportConflict>,
    pub imported: usize,
    pub failed_batches: usize,
    pub outcome: ImportOutcome,
}

impl ImportSummary {
    fn new() -> Self {
        ImportSummary {
            format: None,
            rows: 0,
            extracted: 0,
            conflicts: Vec::new(),
            imported: 0,
            failed_batches: 0,
            outcome: ImportOutcome::Skipped,
        }
    }
}

/// Emits progress only when the value changes
#[derive(Default)]
struct ProgressReporter {
    last: Option<u8>,
}

impl ProgressReporter {
    fn report(&mut self, observer: &mut dyn ImportObserver, value: u8) {
        let value = value.min(100);
        if self.last != Some(value) {
            self.last = Some(value);
            observer.on_event(&ImportEvent::Progress(value));
        }
    }
}

/// Runs imports for one user against a record store
pub struct Importer<'a, S: RecordStore> {
    store: &'a mut S,
    user_id: String,
    batch_size: usize,
}

impl<'a, S: RecordStore> Importer<'a, S> {
    pub fn new(store: &'a mut S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Records per upsert call, at least one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Import the text of one export file
    ///
    /// Failures never escape: they end up as events and in the summary's
    /// outcome and counters.
    pub fn run(
        &mut self,
        file_name: &str,
        text: &str,
        resolver: &mut dyn ConflictResolver,
        observer: &mut dyn ImportObserver,
    ) -> ImportSummary {
        let mut summary = ImportSummary::new();
        let mut progress = ProgressReporter::default();

        observer.on_event(&ImportEvent::Reading {
            file_name: file_name.to_string(),
        });
        progress.report(observer, 0);

        let Some((header, rows)) = split_lines(text) else {
            observer.on_event(&ImportEvent::RowsFound(0));
            observer.on_event(&ImportEvent::UnknownFormat);
            return summary;
        };

        summary.rows = rows.len();
        observer.on_event(&ImportEvent::RowsFound(rows.len()));

        let Some(format) = crate::extract::detect_format(&header) else {
            observer.on_event(&ImportEvent::UnknownFormat);
            return summary;
        };

        summary.format = Some(format);
        observer.on_event(&ImportEvent::FormatDetected(format));

        match format {
            FileFormat::Workout => {
                let extraction = extract_workouts(&header, &rows, &self.user_id, &mut |p| {
                    progress.report(&mut *observer, p)
                });
                self.import_workouts(
                    extraction.records,
                    &mut summary,
                    resolver,
                    observer,
                    &mut progress,
                );
            }
            FileFormat::Measurement => {
                let extraction = extract_checkins(&header, &rows, &self.user_id, &mut |p| {
                    progress.report(&mut *observer, p)
                });
                self.import_checkins(extraction.records, &mut summary, observer, &mut progress);
            }
        }

        summary
    }

    fn import_workouts(
        &mut self,
        incoming: Vec<WorkoutRecord>,
        summary: &mut ImportSummary,
        resolver: &mut dyn ConflictResolver,
        observer: &mut dyn ImportObserver,
        progress: &mut ProgressReporter,
    ) {
        summary.extracted = incoming.len();
        observer.on_event(&ImportEvent::RecordsExtracted {
            format: FileFormat::Workout,
            count: incoming.len(),
        });

        let existing: Vec<WorkoutRecord> = match self.store.fetch_all(&self.user_id) {
            Ok(records) => records,
            Err(e) => {
                abort(summary, observer, format!("failed to load existing workouts: {}", e));
                return;
            }
        };

        let plan = plan_workouts(incoming, &existing);
        summary.conflicts = plan.conflicts.clone();

        if !plan.conflicts.is_empty() {
            observer.on_event(&ImportEvent::ConflictsFound(plan.conflicts.len()));
            for conflict in &plan.conflicts {
                observer.on_event(&ImportEvent::Conflict(conflict.clone()));
            }

            if resolver.resolve(&plan.conflicts) == Decision::Cancel {
                summary.outcome = ImportOutcome::Cancelled;
                observer.on_event(&ImportEvent::Cancelled);
                return;
            }
        }

        tracing::debug!(
            "Committing {} new and {} replaced workout records",
            plan.new_records,
            plan.replacements()
        );

        let (imported, failed) = self.commit(&plan.writes, observer, progress);
        finish(summary, observer, progress, FileFormat::Workout, imported, failed);
    }

    fn import_checkins(
        &mut self,
        incoming: Vec<CheckinRecord>,
        summary: &mut ImportSummary,
        observer: &mut dyn ImportObserver,
        progress: &mut ProgressReporter,
    ) {
        summary.extracted = incoming.len();
        observer.on_event(&ImportEvent::RecordsExtracted {
            format: FileFormat::Measurement,
            count: incoming.len(),
        });

        let existing: Vec<CheckinRecord> = match self.store.fetch_all(&self.user_id) {
            Ok(records) => records,
            Err(e) => {
                abort(summary, observer, format!("failed to load existing check-ins: {}", e));
                return;
            }
        };

        let (writes, merged_days) = merge_checkins(incoming, &existing);
        if merged_days > 0 {
            observer.on_event(&ImportEvent::CheckinsMerged(merged_days));
        }

        let (imported, failed) = self.commit(&writes, observer, progress);
        finish(summary, observer, progress, FileFormat::Measurement, imported, failed);
    }

    /// Upsert records in fixed-size batches
    ///
    /// A failed batch is reported and skipped; later batches still run.
    /// Returns (records written, batches failed).
    fn commit<R: StoredRecord>(
        &mut self,
        records: &[R],
        observer: &mut dyn ImportObserver,
        progress: &mut ProgressReporter,
    ) -> (usize, usize) {
        let mut imported = 0;
        let mut failed = 0;
        let mut attempted = 0;

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            let batch_no = i + 1;
            match self.store.upsert_batch(batch) {
                Ok(()) => {
                    imported += batch.len();
                    observer.on_event(&ImportEvent::BatchCommitted {
                        batch: batch_no,
                        records: batch.len(),
                    });
                }
                Err(e) => {
                    failed += 1;
                    observer.on_event(&ImportEvent::BatchFailed {
                        batch: batch_no,
                        message: e.to_string(),
                    });
                }
            }

            attempted += batch.len();
            progress.report(observer, (50 + attempted * 50 / records.len()) as u8);
        }

        (imported, failed)
    }
}

fn abort(summary: &mut ImportSummary, observer: &mut dyn ImportObserver, message: String) {
    summary.outcome = ImportOutcome::Aborted(message.clone());
    observer.on_event(&ImportEvent::Failed(message));
}

fn finish(
    summary: &mut ImportSummary,
    observer: &mut dyn ImportObserver,
    progress: &mut ProgressReporter,
    format: FileFormat,
    imported: usize,
    failed: usize,
) {
    summary.imported = imported;
    summary.failed_batches = failed;
    summary.outcome = ImportOutcome::Committed;
    progress.report(observer, 100);
    observer.on_event(&ImportEvent::Completed { format, imported });
}
