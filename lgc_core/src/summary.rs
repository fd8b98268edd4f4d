//! Dashboard and score history derived from stored records.
//!
//! Everything here is read-only: it takes records already fetched from a
//! store and computes the numbers shown on the dashboard and the monthly
//! LGC score trend.

use crate::config::ProfileConfig;
use crate::formula::{body_fat, lgc_score};
use crate::{CheckinRecord, Exercise, WorkoutRecord};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Best e1RM for each of the big three lifts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BigThree {
    pub squat: u32,
    pub bench: u32,
    pub deadlift: u32,
}

impl BigThree {
    pub fn total(&self) -> u32 {
        self.squat + self.bench + self.deadlift
    }

    /// Raise the entry for `exercise` to `e1rm` if higher
    fn offer(&mut self, exercise: Exercise, e1rm: u32) {
        let slot = match exercise {
            Exercise::Squat => &mut self.squat,
            Exercise::Bench => &mut self.bench,
            Exercise::Deadlift => &mut self.deadlift,
            _ => return,
        };
        *slot = (*slot).max(e1rm);
    }

    pub fn score(&self, waist: Option<f64>) -> f64 {
        lgc_score(
            self.squat as f64,
            self.bench as f64,
            self.deadlift as f64,
            waist,
        )
    }
}

pub fn best_lifts(workouts: &[WorkoutRecord]) -> BigThree {
    let mut lifts = BigThree::default();
    for w in workouts {
        lifts.offer(w.exercise, w.e1rm);
    }
    lifts
}

/// Most recent value of one check-in field
fn latest_measurement(
    checkins: &[CheckinRecord],
    field: impl Fn(&CheckinRecord) -> Option<f64>,
) -> Option<f64> {
    checkins
        .iter()
        .filter_map(|c| field(c).map(|v| (c.date, v)))
        .max_by_key(|(date, _)| *date)
        .map(|(_, v)| v)
}

pub fn latest_waist(checkins: &[CheckinRecord]) -> Option<f64> {
    latest_measurement(checkins, |c| c.waist)
}

/// Distinct check-in days in the week ending `today`
pub fn checkin_streak(checkins: &[CheckinRecord], today: NaiveDate) -> usize {
    let start = today - Duration::days(6);
    checkins
        .iter()
        .map(|c| c.date)
        .filter(|d| *d >= start && *d <= today)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Distinct training days in the calendar month of `today`
pub fn workouts_in_month(workouts: &[WorkoutRecord], today: NaiveDate) -> usize {
    workouts
        .iter()
        .map(|w| w.date)
        .filter(|d| d.year() == today.year() && d.month() == today.month())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Milestones shown on the dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Win {
    ThousandPoundClub,
    WaistUnder33,
    WeeklyCheckins,
    ScoreOver300,
}

impl fmt::Display for Win {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Win::ThousandPoundClub => "1,000 lb Club member!",
            Win::WaistUnder33 => "Waist under 33 inches",
            Win::WeeklyCheckins => "5+ check-ins this week",
            Win::ScoreOver300 => "LGC Score over 300",
        };
        f.write_str(text)
    }
}

/// Snapshot of where the user stands today
#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub lifts: BigThree,
    pub waist: Option<f64>,
    pub score: f64,
    pub body_fat: Option<f64>,
    pub checkin_streak: usize,
    pub workouts_this_month: usize,
    pub wins: Vec<Win>,
}

impl Dashboard {
    pub fn build(
        workouts: &[WorkoutRecord],
        checkins: &[CheckinRecord],
        profile: &ProfileConfig,
        today: NaiveDate,
    ) -> Self {
        let lifts = best_lifts(workouts);
        let waist = latest_waist(checkins);
        let score = lifts.score(waist);
        let streak = checkin_streak(checkins, today);

        // Check-in measurements win over the static profile values
        let neck = latest_measurement(checkins, |c| c.neck).or(profile.neck);
        let hips = latest_measurement(checkins, |c| c.hips).or(profile.hips);
        let body_fat = match (profile.sex, waist, neck, profile.height) {
            (Some(sex), Some(waist), Some(neck), Some(height)) => {
                body_fat(sex, waist, neck, height, hips)
            }
            _ => None,
        };

        let mut wins = Vec::new();
        if lifts.total() >= 1000 {
            wins.push(Win::ThousandPoundClub);
        }
        if waist.is_some_and(|w| w < 33.0) {
            wins.push(Win::WaistUnder33);
        }
        if streak >= 5 {
            wins.push(Win::WeeklyCheckins);
        }
        if score >= 300.0 {
            wins.push(Win::ScoreOver300);
        }

        Dashboard {
            lifts,
            waist,
            score,
            body_fat,
            checkin_streak: streak,
            workouts_this_month: workouts_in_month(workouts, today),
            wins,
        }
    }
}

/// LGC score for one calendar month
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyScore {
    /// First day of the month
    pub month: NaiveDate,
    pub lifts: BigThree,
    /// Average waist for the month, one decimal
    pub waist: f64,
    pub score: f64,
}

#[derive(Default)]
struct MonthBucket {
    lifts: BigThree,
    waists: Vec<f64>,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Monthly LGC score trend, newest month first
///
/// Each month uses its best e1RM per lift; a lift with no record that month
/// carries over from the most recent earlier month. Months without a waist
/// reading or without any lift total are left out.
pub fn score_history(workouts: &[WorkoutRecord], checkins: &[CheckinRecord]) -> Vec<MonthlyScore> {
    let mut months: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();

    for w in workouts.iter().filter(|w| Exercise::BIG_THREE.contains(&w.exercise)) {
        months
            .entry(month_start(w.date))
            .or_default()
            .lifts
            .offer(w.exercise, w.e1rm);
    }

    for c in checkins {
        if let Some(waist) = c.waist {
            months.entry(month_start(c.date)).or_default().waists.push(waist);
        }
    }

    let mut carried = BigThree::default();
    let mut history = Vec::new();

    for (month, bucket) in months {
        let lifts = BigThree {
            squat: if bucket.lifts.squat > 0 { bucket.lifts.squat } else { carried.squat },
            bench: if bucket.lifts.bench > 0 { bucket.lifts.bench } else { carried.bench },
            deadlift: if bucket.lifts.deadlift > 0 {
                bucket.lifts.deadlift
            } else {
                carried.deadlift
            },
        };
        carried = lifts;

        if lifts.total() == 0 || bucket.waists.is_empty() {
            continue;
        }

        let avg_waist = bucket.waists.iter().sum::<f64>() / bucket.waists.len() as f64;
        history.push(MonthlyScore {
            month,
            lifts,
            waist: (avg_waist * 10.0).round() / 10.0,
            score: lifts.score(Some(avg_waist)),
        });
    }

    history.reverse();
    history
}
