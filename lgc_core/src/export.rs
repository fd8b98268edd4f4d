//! CSV export of stored records.
//!
//! Records are written oldest first with a header row. Each workout's sets
//! are flattened into one `weightxreps` list so a record stays one row.

use crate::{CheckinRecord, Result, SetEntry, WorkoutRecord};
use std::fs::File;
use std::path::Path;

/// A workout record as written to CSV
#[derive(Debug, serde::Serialize)]
struct WorkoutRow<'a> {
    date: String,
    exercise: &'a str,
    exercise_name: &'a str,
    best_weight: f64,
    best_reps: u32,
    e1rm: u32,
    sets: String,
}

impl<'a> From<&'a WorkoutRecord> for WorkoutRow<'a> {
    fn from(record: &'a WorkoutRecord) -> Self {
        WorkoutRow {
            date: record.date.to_string(),
            exercise: record.exercise.key(),
            exercise_name: &record.exercise_name,
            best_weight: record.best_weight,
            best_reps: record.best_reps,
            e1rm: record.e1rm,
            sets: format_sets(&record.sets),
        }
    }
}

/// A check-in record as written to CSV
#[derive(Debug, serde::Serialize)]
struct CheckinRow<'a> {
    date: String,
    weight: Option<f64>,
    waist: Option<f64>,
    neck: Option<f64>,
    hips: Option<f64>,
    sleep_quality: Option<u8>,
    notes: Option<&'a str>,
}

impl<'a> From<&'a CheckinRecord> for CheckinRow<'a> {
    fn from(record: &'a CheckinRecord) -> Self {
        CheckinRow {
            date: record.date.to_string(),
            weight: record.weight,
            waist: record.waist,
            neck: record.neck,
            hips: record.hips,
            sleep_quality: record.sleep_quality.map(|s| s.get()),
            notes: record.notes.as_deref(),
        }
    }
}

/// `225x5;245x3`, in set order
fn format_sets(sets: &[SetEntry]) -> String {
    sets.iter()
        .map(|s| format!("{}x{}", s.weight, s.reps))
        .collect::<Vec<_>>()
        .join(";")
}

fn open_for_write(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn finish(writer: csv::Writer<File>) -> Result<()> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Write workout records to a CSV file, returning the row count
pub fn export_workouts(records: &[WorkoutRecord], path: &Path) -> Result<usize> {
    let mut sorted: Vec<&WorkoutRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.key());

    let mut writer = csv::Writer::from_writer(open_for_write(path)?);
    for record in &sorted {
        writer.serialize(WorkoutRow::from(*record))?;
    }
    writer.flush()?;
    finish(writer)?;

    tracing::info!("Exported {} workout records to {:?}", sorted.len(), path);
    Ok(sorted.len())
}

/// Write check-in records to a CSV file, returning the row count
pub fn export_checkins(records: &[CheckinRecord], path: &Path) -> Result<usize> {
    let mut sorted: Vec<&CheckinRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut writer = csv::Writer::from_writer(open_for_write(path)?);
    for record in &sorted {
        writer.serialize(CheckinRow::from(*record))?;
    }
    writer.flush()?;
    finish(writer)?;

    tracing::info!("Exported {} check-in records to {:?}", sorted.len(), path);
    Ok(sorted.len())
}
