//! Record extraction from app export files.
//!
//! Two export shapes are recognised by their header:
//! - Workout exports ("Exercise Name" column), one row per performed set
//! - Measurement exports ("Measurement Type" column), one row per reading
//!
//! Set rows are folded into one [`WorkoutRecord`] per day per tracked
//! exercise; measurement rows into one [`CheckinRecord`] per day.
//! Rows that cannot be used are skipped without error.

use crate::csv_line::{parse_line, Header};
use crate::{CheckinRecord, Exercise, SetEntry, WorkoutKey, WorkoutRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const COL_DATE: &str = "Date";
pub const COL_EXERCISE_NAME: &str = "Exercise Name";
pub const COL_SET_ORDER: &str = "Set Order";
pub const COL_WEIGHT: &str = "Weight";
pub const COL_REPS: &str = "Reps";
pub const COL_RPE: &str = "RPE";
pub const COL_MEASUREMENT_TYPE: &str = "Measurement Type";
pub const COL_VALUE: &str = "Value";

/// Set order marker for warm-up sets
const WARMUP_MARKER: &str = "W";

/// Kind of export file, decided by header inspection
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Workout,
    Measurement,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Workout => f.write_str("workout"),
            FileFormat::Measurement => f.write_str("measurement"),
        }
    }
}

/// Detect the export format, None when the header is not recognised
pub fn detect_format(header: &Header) -> Option<FileFormat> {
    if header.contains(COL_EXERCISE_NAME) {
        Some(FileFormat::Workout)
    } else if header.contains(COL_MEASUREMENT_TYPE) {
        Some(FileFormat::Measurement)
    } else {
        None
    }
}

// ============================================================================
// Exercise name mapping
// ============================================================================

/// One entry of the exercise mapping table
///
/// A name matches when every pattern of at least one `any_of` group occurs
/// in it and none of the `none_of` patterns do. Patterns are lowercase and
/// compared against the lowercased name.
#[derive(Clone, Copy, Debug)]
pub struct ExerciseRule {
    pub exercise: Exercise,
    pub any_of: &'static [&'static [&'static str]],
    pub none_of: &'static [&'static str],
}

impl ExerciseRule {
    pub fn matches(&self, lowered_name: &str) -> bool {
        let included = self
            .any_of
            .iter()
            .any(|group| group.iter().all(|p| lowered_name.contains(p)));

        included && !self.none_of.iter().any(|p| lowered_name.contains(p))
    }
}

/// Ordered mapping rules, first match wins
pub const EXERCISE_RULES: &[ExerciseRule] = &[
    ExerciseRule {
        exercise: Exercise::Squat,
        any_of: &[&["squat"]],
        none_of: &["split"],
    },
    ExerciseRule {
        exercise: Exercise::Bench,
        any_of: &[&["bench press"]],
        none_of: &["incline", "close"],
    },
    ExerciseRule {
        exercise: Exercise::Deadlift,
        any_of: &[&["deadlift"]],
        none_of: &["romanian", "stiff"],
    },
    ExerciseRule {
        exercise: Exercise::Chinup,
        any_of: &[&["chin"], &["pull", "up"]],
        none_of: &[],
    },
    ExerciseRule {
        exercise: Exercise::Row,
        any_of: &[&["row", "barbell"]],
        none_of: &[],
    },
    ExerciseRule {
        exercise: Exercise::Ohp,
        any_of: &[&["overhead"], &["ohp"], &["shoulder press"]],
        none_of: &[],
    },
];

/// Map a free-text exercise name onto a tracked exercise
pub fn map_exercise(name: &str) -> Option<Exercise> {
    let lowered = name.to_lowercase();
    EXERCISE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.exercise)
}

// ============================================================================
// Field parsing
// ============================================================================

/// Calendar date from the first token of a date/time field
pub fn parse_date(field: &str) -> Option<NaiveDate> {
    let day = field.split_whitespace().next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Strictly positive finite number
fn parse_positive(field: &str) -> Option<f64> {
    let value: f64 = field.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Whole repetitions; exports sometimes write reps as "8.0"
fn parse_reps(field: &str) -> Option<u32> {
    let value = parse_positive(field)?.trunc();
    (value >= 1.0 && value <= u32::MAX as f64).then_some(value as u32)
}

fn field<'a>(fields: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| fields.get(i)).map(String::as_str)
}

// ============================================================================
// Extraction
// ============================================================================

/// Records extracted from one file, with row accounting
#[derive(Clone, Debug)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    /// Data rows in the file
    pub rows: usize,
    /// Rows that contributed to a record
    pub used_rows: usize,
}

/// Percentage of extraction done, scaled into 0..=50
fn extraction_progress(row_index: usize, total_rows: usize) -> u8 {
    if total_rows == 0 {
        return 50;
    }
    ((row_index + 1) * 50 / total_rows).min(50) as u8
}

struct SetGroup {
    exercise_name: String,
    sets: Vec<SetEntry>,
}

/// Fold set-level rows into one record per (date, exercise)
///
/// `on_progress` receives values in 0..=50 as rows are consumed.
pub fn extract_workouts(
    header: &Header,
    rows: &[&str],
    user_id: &str,
    on_progress: &mut dyn FnMut(u8),
) -> Extraction<WorkoutRecord> {
    let date_idx = header.index_of(COL_DATE);
    let name_idx = header.index_of(COL_EXERCISE_NAME);
    let order_idx = header.index_of(COL_SET_ORDER);
    let weight_idx = header.index_of(COL_WEIGHT);
    let reps_idx = header.index_of(COL_REPS);
    let rpe_idx = header.index_of(COL_RPE);

    let mut groups: BTreeMap<WorkoutKey, SetGroup> = BTreeMap::new();
    let mut used_rows = 0;

    for (i, line) in rows.iter().enumerate() {
        let fields = parse_line(line);

        let parsed = (|| {
            let date = parse_date(field(&fields, date_idx)?)?;
            let name = field(&fields, name_idx)?;
            if field(&fields, order_idx).is_some_and(|o| o.eq_ignore_ascii_case(WARMUP_MARKER)) {
                return None;
            }
            let weight = parse_positive(field(&fields, weight_idx)?)?;
            let reps = parse_reps(field(&fields, reps_idx)?)?;
            let exercise = map_exercise(name)?;
            let rpe = field(&fields, rpe_idx).and_then(parse_positive);
            Some((date, exercise, name, weight, reps, rpe))
        })();

        if let Some((date, exercise, name, weight, reps, rpe)) = parsed {
            let group = groups.entry((date, exercise)).or_insert_with(|| SetGroup {
                exercise_name: name.to_string(),
                sets: Vec::new(),
            });
            let set_number = group.sets.len() as u32 + 1;
            group.sets.push(SetEntry {
                weight,
                reps,
                rpe,
                set_number,
            });
            used_rows += 1;
        }

        on_progress(extraction_progress(i, rows.len()));
    }

    let records: Vec<WorkoutRecord> = groups
        .into_iter()
        .filter_map(|((date, exercise), group)| {
            WorkoutRecord::from_sets(user_id, date, exercise, &group.exercise_name, group.sets)
        })
        .collect();

    tracing::debug!(
        "Extracted {} workout records from {} of {} rows",
        records.len(),
        used_rows,
        rows.len()
    );

    Extraction {
        records,
        rows: rows.len(),
        used_rows,
    }
}

/// Fold measurement rows into one check-in per date
///
/// Only weight and waist readings are tracked; dates without either
/// produce no record.
pub fn extract_checkins(
    header: &Header,
    rows: &[&str],
    user_id: &str,
    on_progress: &mut dyn FnMut(u8),
) -> Extraction<CheckinRecord> {
    let date_idx = header.index_of(COL_DATE);
    let type_idx = header.index_of(COL_MEASUREMENT_TYPE);
    let value_idx = header.index_of(COL_VALUE);

    let mut days: BTreeMap<NaiveDate, CheckinRecord> = BTreeMap::new();
    let mut used_rows = 0;

    for (i, line) in rows.iter().enumerate() {
        let fields = parse_line(line);

        let parsed = (|| {
            let date = parse_date(field(&fields, date_idx)?)?;
            let kind = field(&fields, type_idx)?.to_lowercase();
            let value = parse_positive(field(&fields, value_idx)?)?;
            Some((date, kind, value))
        })();

        if let Some((date, kind, value)) = parsed {
            let entry = days
                .entry(date)
                .or_insert_with(|| CheckinRecord::new(user_id, date));
            let mut used = false;
            if kind.contains("weight") {
                entry.weight = Some(value);
                used = true;
            }
            if kind.contains("waist") {
                entry.waist = Some(value);
                used = true;
            }
            if used {
                used_rows += 1;
            }
        }

        on_progress(extraction_progress(i, rows.len()));
    }

    let records: Vec<CheckinRecord> = days
        .into_values()
        .filter(|c| c.weight.is_some() || c.waist.is_some())
        .collect();

    tracing::debug!(
        "Extracted {} check-in days from {} of {} rows",
        records.len(),
        used_rows,
        rows.len()
    );

    Extraction {
        records,
        rows: rows.len(),
        used_rows,
    }
}
