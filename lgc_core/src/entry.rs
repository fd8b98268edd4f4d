//! Manual logging of workouts and check-ins.
//!
//! A logged workout is written straight through: it replaces whatever was
//! stored for that day and exercise without conflict review. A logged
//! check-in fills in the fields given and keeps every other stored field.

use crate::store::RecordStore;
use crate::{CheckinRecord, Error, Exercise, Result, SetEntry, SleepQuality, WorkoutRecord};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Day templates
// ============================================================================

/// One exercise slot in a training day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateExercise {
    pub exercise: Exercise,
    pub name: &'static str,
    pub sets: u32,
    pub reps: u32,
}

/// The three rotating training days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayTemplate {
    Squat,
    Bench,
    Deadlift,
}

const SQUAT_DAY: &[TemplateExercise] = &[
    TemplateExercise { exercise: Exercise::Squat, name: "Squat (Barbell)", sets: 3, reps: 10 },
    TemplateExercise { exercise: Exercise::Chinup, name: "Chin-up", sets: 3, reps: 8 },
];

const BENCH_DAY: &[TemplateExercise] = &[
    TemplateExercise { exercise: Exercise::Bench, name: "Bench Press (Barbell)", sets: 3, reps: 8 },
    TemplateExercise { exercise: Exercise::Row, name: "Pendlay Row (Barbell)", sets: 3, reps: 8 },
];

const DEADLIFT_DAY: &[TemplateExercise] = &[
    TemplateExercise { exercise: Exercise::Deadlift, name: "Deadlift (Barbell)", sets: 2, reps: 6 },
    TemplateExercise { exercise: Exercise::Ohp, name: "Overhead Press (Barbell)", sets: 3, reps: 8 },
];

impl DayTemplate {
    pub const ALL: [DayTemplate; 3] = [DayTemplate::Squat, DayTemplate::Bench, DayTemplate::Deadlift];

    pub fn name(self) -> &'static str {
        match self {
            DayTemplate::Squat => "Squat Day",
            DayTemplate::Bench => "Bench Day",
            DayTemplate::Deadlift => "Deadlift Day",
        }
    }

    pub fn exercises(self) -> &'static [TemplateExercise] {
        match self {
            DayTemplate::Squat => SQUAT_DAY,
            DayTemplate::Bench => BENCH_DAY,
            DayTemplate::Deadlift => DEADLIFT_DAY,
        }
    }
}

impl fmt::Display for DayTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "squat" => Ok(DayTemplate::Squat),
            "bench" => Ok(DayTemplate::Bench),
            "deadlift" => Ok(DayTemplate::Deadlift),
            other => Err(Error::Input(format!("unknown training day '{}'", other))),
        }
    }
}

/// Display name used when a logged workout does not give one
pub fn default_exercise_name(exercise: Exercise) -> &'static str {
    DayTemplate::ALL
        .iter()
        .flat_map(|day| day.exercises())
        .find(|slot| slot.exercise == exercise)
        .map(|slot| slot.name)
        .unwrap_or_else(|| exercise.key())
}

// ============================================================================
// Workouts
// ============================================================================

/// One set as typed by the user: `WEIGHTxREPS` or `WEIGHTxREPS@RPE`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetInput {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
}

impl FromStr for SetInput {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Input(format!("'{}' is not a set, expected e.g. 225x5 or 225x5@8", s));

        let (work, rpe) = match s.trim().split_once('@') {
            Some((work, rpe)) => (work, Some(rpe)),
            None => (s.trim(), None),
        };
        let (weight, reps) = work
            .split_once(&['x', 'X'][..])
            .ok_or_else(invalid)?;

        let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
        let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;
        if !weight.is_finite() || weight <= 0.0 || reps == 0 {
            return Err(invalid());
        }

        let rpe = match rpe {
            Some(raw) => {
                let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
                if !(value > 0.0 && value <= 10.0) {
                    return Err(Error::OutOfRange {
                        field: "rpe",
                        value: raw.trim().to_string(),
                        range: "above 0, at most 10".into(),
                    });
                }
                Some(value)
            }
            None => None,
        };

        Ok(SetInput { weight, reps, rpe })
    }
}

/// Record one exercise's sets for a day
///
/// Sets are numbered in the order given. Returns the record as stored.
pub fn log_workout<S: RecordStore>(
    store: &mut S,
    user_id: &str,
    date: NaiveDate,
    exercise: Exercise,
    exercise_name: Option<&str>,
    sets: &[SetInput],
) -> Result<WorkoutRecord> {
    let entries: Vec<SetEntry> = sets
        .iter()
        .zip(1..)
        .map(|(set, set_number)| SetEntry {
            weight: set.weight,
            reps: set.reps,
            rpe: set.rpe,
            set_number,
        })
        .collect();

    let name = exercise_name.unwrap_or_else(|| default_exercise_name(exercise));
    let record = WorkoutRecord::from_sets(user_id, date, exercise, name, entries)
        .ok_or_else(|| Error::Input("no sets to log".into()))?;

    store.upsert_batch(std::slice::from_ref(&record))?;
    tracing::info!(
        "Logged {} on {}: {}x{} (e1RM {})",
        exercise,
        date,
        record.best_weight,
        record.best_reps,
        record.e1rm
    );

    let stored: Vec<WorkoutRecord> = store.fetch_all(user_id)?;
    Ok(stored
        .into_iter()
        .find(|r| r.key() == record.key())
        .unwrap_or(record))
}

// ============================================================================
// Check-ins
// ============================================================================

/// Check-in fields as typed by the user; absent fields are left alone
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckinEntry {
    pub weight: Option<f64>,
    pub waist: Option<f64>,
    pub neck: Option<f64>,
    pub hips: Option<f64>,
    pub sleep_quality: Option<u8>,
    pub notes: Option<String>,
}

fn positive(field: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(Error::OutOfRange {
            field,
            value: v.to_string(),
            range: "greater than 0".into(),
        }),
        other => Ok(other),
    }
}

/// Record a day's check-in
///
/// Needs at least a weight or a waist. Given fields replace stored ones;
/// everything else on a stored check-in for that day is kept.
pub fn log_checkin<S: RecordStore>(
    store: &mut S,
    user_id: &str,
    date: NaiveDate,
    entry: CheckinEntry,
) -> Result<CheckinRecord> {
    if entry.weight.is_none() && entry.waist.is_none() {
        return Err(Error::Input("enter at least a weight or a waist measurement".into()));
    }

    let weight = positive("weight", entry.weight)?;
    let waist = positive("waist", entry.waist)?;
    let neck = positive("neck", entry.neck)?;
    let hips = positive("hips", entry.hips)?;
    let sleep_quality = entry.sleep_quality.map(SleepQuality::try_from).transpose()?;
    let notes = entry
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let existing: Vec<CheckinRecord> = store.fetch_all(user_id)?;
    let base = existing
        .into_iter()
        .find(|c| c.date == date)
        .unwrap_or_else(|| CheckinRecord::new(user_id, date));

    let record = CheckinRecord {
        weight: weight.or(base.weight),
        waist: waist.or(base.waist),
        neck: neck.or(base.neck),
        hips: hips.or(base.hips),
        sleep_quality: sleep_quality.or(base.sleep_quality),
        notes: notes.or(base.notes.clone()),
        ..base
    };

    store.upsert_batch(std::slice::from_ref(&record))?;
    tracing::info!("Logged check-in for {}", date);
    Ok(record)
}
