//! Core domain types for Lazy Gains Club.
//!
//! This module defines the records the import engine reads and writes:
//! - Tracked exercises and individual sets
//! - Workout records (best performance per day per exercise)
//! - Check-in records (body measurements per day)
//! - Profile attributes used by the body-fat estimate

use crate::formula;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// The closed vocabulary of tracked movements
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Squat,
    Bench,
    Deadlift,
    Chinup,
    Row,
    Ohp,
}

impl Exercise {
    /// Lifts that make up the LGC total
    pub const BIG_THREE: [Exercise; 3] = [Exercise::Squat, Exercise::Bench, Exercise::Deadlift];

    /// Storage key for this exercise
    pub fn key(self) -> &'static str {
        match self {
            Exercise::Squat => "squat",
            Exercise::Bench => "bench",
            Exercise::Deadlift => "deadlift",
            Exercise::Chinup => "chinup",
            Exercise::Row => "row",
            Exercise::Ohp => "ohp",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Exercise {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let key = s.trim().to_lowercase();
        [
            Exercise::Squat,
            Exercise::Bench,
            Exercise::Deadlift,
            Exercise::Chinup,
            Exercise::Row,
            Exercise::Ohp,
        ]
        .into_iter()
        .find(|e| e.key() == key)
        .ok_or_else(|| crate::Error::Input(format!("unknown exercise '{}'", s)))
    }
}

/// Biological sex, selects the body-fat formula branch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

// ============================================================================
// Workout Records
// ============================================================================

/// One performed set within a workout record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    /// 1-based position in arrival order
    pub set_number: u32,
}

/// Natural key of a workout record within one user's data
pub type WorkoutKey = (NaiveDate, Exercise);

/// Best performance for one exercise on one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub exercise: Exercise,
    pub exercise_name: String,
    pub sets: Vec<SetEntry>,
    pub best_weight: f64,
    pub best_reps: u32,
    pub e1rm: u32,
}

impl WorkoutRecord {
    /// Build a record from its sets, picking the best set and deriving e1RM
    ///
    /// The best set has the highest weight, ties broken by higher reps.
    /// Returns None when there are no sets.
    pub fn from_sets(
        user_id: &str,
        date: NaiveDate,
        exercise: Exercise,
        exercise_name: &str,
        sets: Vec<SetEntry>,
    ) -> Option<Self> {
        let (best_weight, best_reps) = best_set(&sets)?;

        Some(WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            exercise,
            exercise_name: exercise_name.to_string(),
            sets,
            best_weight,
            best_reps,
            e1rm: formula::e1rm(best_weight, best_reps),
        })
    }

    pub fn key(&self) -> WorkoutKey {
        (self.date, self.exercise)
    }
}

/// Highest weight wins; equal weights fall back to more reps
pub fn best_set(sets: &[SetEntry]) -> Option<(f64, u32)> {
    let mut best: Option<(f64, u32)> = None;
    for set in sets {
        best = match best {
            Some((w, r)) if set.weight < w || (set.weight == w && set.reps <= r) => Some((w, r)),
            _ => Some((set.weight, set.reps)),
        };
    }
    best
}

// ============================================================================
// Check-in Records
// ============================================================================

/// Subjective sleep rating, always within 1..=10
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct SleepQuality(u8);

impl SleepQuality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(SleepQuality(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SleepQuality {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        SleepQuality::new(value).ok_or_else(|| {
            crate::Error::OutOfRange {
                field: "sleep_quality",
                value: value.to_string(),
                range: format!("{}..={}", SleepQuality::MIN, SleepQuality::MAX),
            }
        })
    }
}

impl From<SleepQuality> for u8 {
    fn from(value: SleepQuality) -> Self {
        value.0
    }
}

/// Stored sleep quality as found on disk, whatever its shape
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSleepQuality {
    Number(f64),
    Other(serde::de::IgnoredAny),
}

/// Read a stored rating, treating anything outside 1..=10 as absent
///
/// A bad rating must not make the whole check-in unreadable.
fn lenient_sleep_quality<'de, D>(deserializer: D) -> std::result::Result<Option<SleepQuality>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<RawSleepQuality>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawSleepQuality::Number(n)) if n.fract() == 0.0 && (0.0..=255.0).contains(&n) => {
            SleepQuality::new(n as u8)
        }
        _ => None,
    })
}

/// Body measurements and wellness notes for one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CheckinRecord {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub waist: Option<f64>,
    #[serde(default)]
    pub neck: Option<f64>,
    #[serde(default)]
    pub hips: Option<f64>,
    #[serde(default, deserialize_with = "lenient_sleep_quality")]
    pub sleep_quality: Option<SleepQuality>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckinRecord {
    /// An empty check-in for the given day
    pub fn new(user_id: &str, date: NaiveDate) -> Self {
        CheckinRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            weight: None,
            waist: None,
            neck: None,
            hips: None,
            sleep_quality: None,
            notes: None,
        }
    }

    /// True when no measurement or note is recorded
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.waist.is_none()
            && self.neck.is_none()
            && self.hips.is_none()
            && self.sleep_quality.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(weight: f64, reps: u32, n: u32) -> SetEntry {
        SetEntry {
            weight,
            reps,
            rpe: None,
            set_number: n,
        }
    }

    #[test]
    fn test_best_set_prefers_weight_then_reps() {
        let sets = vec![set(185.0, 8, 1), set(205.0, 3, 2), set(205.0, 5, 3), set(195.0, 6, 4)];
        assert_eq!(best_set(&sets), Some((205.0, 5)));
        assert_eq!(best_set(&[]), None);
    }

    #[test]
    fn test_from_sets_derives_e1rm() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record =
            WorkoutRecord::from_sets("u1", date, Exercise::Bench, "Bench Press (Barbell)", vec![set(225.0, 1, 1)])
                .unwrap();
        assert_eq!(record.best_weight, 225.0);
        assert_eq!(record.e1rm, 225);
        assert_eq!(record.key(), (date, Exercise::Bench));
    }

    #[test]
    fn test_sleep_quality_bounds() {
        assert!(SleepQuality::new(0).is_none());
        assert!(SleepQuality::new(11).is_none());
        assert_eq!(SleepQuality::new(7).map(SleepQuality::get), Some(7));

        let parsed: std::result::Result<SleepQuality, _> = serde_json::from_str("12");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_stored_checkin_with_bad_sleep_quality_still_reads() {
        let line = r#"{"id":"6f1c1f64-5b0e-4a8e-9d3c-0c9f4d2b7a11","user_id":"u1","date":"2024-02-05","weight":180.0,"notes":"felt good","sleep_quality":12}"#;
        let record: CheckinRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.weight, Some(180.0));
        assert_eq!(record.notes.as_deref(), Some("felt good"));
        assert_eq!(record.sleep_quality, None);

        for raw in ["0", "-3", "7.5", "\"good\"", "null"] {
            let line = format!(
                r#"{{"id":"6f1c1f64-5b0e-4a8e-9d3c-0c9f4d2b7a11","user_id":"u1","date":"2024-02-05","sleep_quality":{}}}"#,
                raw
            );
            let record: CheckinRecord = serde_json::from_str(&line).unwrap();
            assert_eq!(record.sleep_quality, None, "rating {}", raw);
        }

        let line = r#"{"id":"6f1c1f64-5b0e-4a8e-9d3c-0c9f4d2b7a11","user_id":"u1","date":"2024-02-05","sleep_quality":8}"#;
        let record: CheckinRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.sleep_quality.map(SleepQuality::get), Some(8));
    }

    #[test]
    fn test_exercise_from_key() {
        assert_eq!("Deadlift".parse::<Exercise>().unwrap(), Exercise::Deadlift);
        assert_eq!(" ohp ".parse::<Exercise>().unwrap(), Exercise::Ohp);
        assert!(matches!("curl".parse::<Exercise>(), Err(crate::Error::Input(_))));
    }

    #[test]
    fn test_exercise_serializes_as_key() {
        let json = serde_json::to_string(&Exercise::Ohp).unwrap();
        assert_eq!(json, "\"ohp\"");
        let parsed: Exercise = serde_json::from_str("\"chinup\"").unwrap();
        assert_eq!(parsed, Exercise::Chinup);
    }
}
