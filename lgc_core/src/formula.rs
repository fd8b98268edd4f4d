//! Strength and body-composition formulas.
//!
//! All functions are pure. Invalid inputs produce a zero or `None` result
//! rather than an error.

use crate::Sex;

/// Reps beyond this count no longer raise the estimate
pub const E1RM_REP_CAP: u32 = 12;

/// Estimated one-rep max for a weight lifted for `reps` repetitions
///
/// Single reps return the weight itself; everything else uses
/// `weight * 36 / (37 - reps)` with reps capped at [`E1RM_REP_CAP`].
pub fn e1rm(weight: f64, reps: u32) -> u32 {
    if reps == 0 || !weight.is_finite() || weight <= 0.0 {
        return 0;
    }

    if reps == 1 {
        return whole_pounds(weight);
    }

    let capped = reps.min(E1RM_REP_CAP);
    whole_pounds(weight * 36.0 / (37 - capped) as f64)
}

/// Round to the nearest integer, clamped to the `u32` range
fn whole_pounds(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}

/// LGC Score: big-three total relative to waist, one decimal place
///
/// Rounds with `f64::round` (half away from zero) on `total / waist * 100`.
pub fn lgc_score(squat: f64, bench: f64, deadlift: f64, waist: Option<f64>) -> f64 {
    let waist = match waist {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => return 0.0,
    };

    let total = squat + bench + deadlift;
    if total == 0.0 {
        return 0.0;
    }

    ((total / waist) * 100.0).round() / 10.0
}

/// Circumference-based body-fat percentage (US Navy method)
///
/// The female branch needs hip circumference and returns `None` without it.
/// Inputs that would take the logarithm of a non-positive number also
/// yield `None`.
pub fn body_fat(sex: Sex, waist: f64, neck: f64, height: f64, hips: Option<f64>) -> Option<f64> {
    if height <= 0.0 {
        return None;
    }

    let estimate = match sex {
        Sex::Male => {
            let girth = waist - neck;
            if girth <= 0.0 {
                return None;
            }
            86.010 * girth.log10() - 70.041 * height.log10() + 36.76
        }
        Sex::Female => {
            let girth = waist + hips? - neck;
            if girth <= 0.0 {
                return None;
            }
            163.205 * girth.log10() - 97.684 * height.log10() - 78.387
        }
    };

    estimate
        .is_finite()
        .then(|| (estimate * 10.0).round() / 10.0)
}
