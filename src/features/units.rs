//! Unit conversion and derived features
//!
//! Pure arithmetic over raw form quantities: imperial height, kg/lb weight,
//! boolean toggles and the stress/activity interaction term.

use serde::{Deserialize, Serialize};

pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_LB: f64 = 0.453592;
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Unit the weight was entered in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

/// Height in metres from feet + inches.
pub fn height_m(feet: f64, inches: f64) -> f64 {
    ((feet * INCHES_PER_FOOT + inches) * CM_PER_INCH) / 100.0
}

/// Weight in kilograms.
pub fn weight_kg(weight: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Lb => weight * KG_PER_LB,
        WeightUnit::Kg => weight,
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// BMI rounded to one decimal, or `None` when the height is not positive.
pub fn bmi(feet: f64, inches: f64, weight: f64, unit: WeightUnit) -> Option<f64> {
    let h = height_m(feet, inches);
    if h.is_nan() || h <= 0.0 {
        return None;
    }
    Some(round_to(weight_kg(weight, unit) / (h * h), 1))
}

/// Recompute BMI, keeping `previous` when the height cannot produce one.
pub fn update_bmi(previous: f64, feet: f64, inches: f64, weight: f64, unit: WeightUnit) -> f64 {
    bmi(feet, inches, weight, unit).unwrap_or(previous)
}

/// 1.0 / 0.0 feature flag.
pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Normalise a yes/no answer to {0, 1}.
///
/// Forms encode these either as {1 = Yes, 2 = No} or as {0, 1}; only an
/// exact 1 means yes in both.
pub fn yes_no(raw: f64) -> f64 {
    flag(raw == 1.0)
}

/// `STRESSxPA`: stress only counts for people reporting no activity.
///
/// `pa_any` must already be normalised with [`yes_no`].
pub fn stress_activity_interaction(stress_score: f64, pa_any: f64) -> f64 {
    stress_score * (1.0 - pa_any)
}
