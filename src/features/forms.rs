//! Raw questionnaire answers and their derivation into features
//!
//! Forms deserialize from JSON or TOML. Numeric answers are optional so a
//! half-filled form still loads; [`GlucoseForm::features`] and
//! [`HeartForm::features`] reject it if a required answer is missing.

use super::units::{self, WeightUnit};
use super::{safe_or, FeatureMap, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Age, height and weight shared by both questionnaires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub height_ft: Option<f64>,
    #[serde(default)]
    pub height_in: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub unit: WeightUnit,
}

impl BodyMeasurements {
    /// BMI from the entered height and weight, if the height is usable
    pub fn bmi(&self) -> Option<f64> {
        units::bmi(
            safe_or(self.height_ft, 0.0),
            safe_or(self.height_in, 0.0),
            safe_or(self.weight, 0.0),
            self.unit,
        )
    }

    /// Check the mandatory answers and return `(age, bmi)`.
    fn validate(&self) -> ValidationResult<(f64, f64)> {
        let age = positive(self.age, "AGE")?;
        positive(self.height_ft, "HEIGHT_FT")?;
        positive(self.weight, "WEIGHT")?;
        let bmi = match self.bmi() {
            Some(b) if b > 0.0 => b,
            _ => return Err(ValidationError::MissingField { field: "BMI" }),
        };
        Ok((age, bmi))
    }
}

/// Diabetes questionnaire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucoseForm {
    #[serde(flatten)]
    pub body: BodyMeasurements,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub hypertension: bool,
    /// 0 = non-smoker, 1 = occasional, 2 = regular, 3 = heavy
    #[serde(default)]
    pub smoking_level: Option<f64>,
    /// Fasting glucose in mg/dL; optional
    #[serde(default)]
    pub fasting_glucose: Option<f64>,
    #[serde(default)]
    pub physically_active: bool,
}

impl GlucoseForm {
    /// Derive the glucose model's features.
    ///
    /// `GLU` is passed through as entered (0 when blank); the default is
    /// applied and reported by [`super::FeatureVector::assemble`].
    pub fn features(&self) -> ValidationResult<FeatureMap> {
        let (age, bmi) = self.body.validate()?;
        let sex_male = sex_flag(self.sex)?;
        let smoking = match self.smoking_level {
            Some(level) if !level.is_nan() => level,
            _ => return Err(ValidationError::MissingField { field: "SMOKING_IDX" }),
        };
        if !(0.0..=3.0).contains(&smoking) {
            return Err(ValidationError::InvalidField {
                field: "SMOKING_IDX",
                reason: format!("expected a level between 0 and 3, got {smoking}"),
            });
        }

        Ok(FeatureMap::new()
            .with("AGE", age)
            .with("BMI", bmi)
            .with("SEX_MALE", sex_male)
            .with("HTN_FLAG", units::flag(self.hypertension))
            .with("SMOKING_IDX", smoking)
            .with("GLU", safe_or(self.fasting_glucose, 0.0))
            .with("PA_ANY", units::flag(self.physically_active)))
    }
}

/// Heart questionnaire
///
/// `pa_any` and `pa_index` are raw yes/no codes ({1 = Yes, 2 = No} or
/// {0, 1}); they are normalised to {0, 1} here and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartForm {
    #[serde(flatten)]
    pub body: BodyMeasurements,
    #[serde(default)]
    pub sex: Option<Sex>,
    /// Any physical activity in the last 30 days
    #[serde(default)]
    pub pa_any: Option<f64>,
    /// Meets the 150 min/week activity guideline
    #[serde(default)]
    pub pa_index: Option<f64>,
    /// 1 walking, 2 running, 3 cycling, 4 strength, 10 yoga, 11 other
    #[serde(default)]
    pub activity_type: Option<f64>,
    #[serde(default)]
    pub exercise_per_week: Option<f64>,
    #[serde(default)]
    pub strength_per_week: Option<f64>,
    /// Days of poor mental health in the last 30
    #[serde(default)]
    pub stress_days: Option<f64>,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub heavy_drinker: bool,
    #[serde(default)]
    pub high_cholesterol: bool,
    /// Cholesterol checked within the last five years
    #[serde(default)]
    pub cholesterol_screened: bool,
    #[serde(default)]
    pub insured: bool,
}

impl HeartForm {
    pub const DEFAULT_STRESS_SCORE: f64 = 0.0;
    pub const DEFAULT_EXER_FREQ_WK: f64 = 2.0;
    pub const DEFAULT_STRENGTH_FREQ: f64 = 1.0;
    pub const DEFAULT_ACTIVITY_TYPE_CODE: f64 = 1.0;

    /// Derive all sixteen heart features, including `STRESSxPA`.
    pub fn features(&self) -> ValidationResult<FeatureMap> {
        let (age, bmi) = self.body.validate()?;
        let sex_male = sex_flag(self.sex)?;
        let pa_any = units::yes_no(required(self.pa_any, "PA_ANY")?);
        let pa_index = units::yes_no(required(self.pa_index, "PA_INDEX")?);

        let stress = safe_or(self.stress_days, Self::DEFAULT_STRESS_SCORE);

        Ok(FeatureMap::new()
            .with("AGE", age)
            .with("BMI", bmi)
            .with("PA_ANY", pa_any)
            .with("SMOKING_IDX", units::flag(self.smoker))
            .with("HTN_FLAG", units::flag(self.hypertension))
            .with("STRESS_SCORE", stress)
            .with("PA_INDEX", pa_index)
            .with(
                "STRESSxPA",
                units::stress_activity_interaction(stress, pa_any),
            )
            .with("ALC_FLAG", units::flag(self.heavy_drinker))
            .with("CHOL_FLAG", units::flag(self.high_cholesterol))
            // Encoded as "no recent screening"
            .with("CHOL_SCREEN", units::flag(!self.cholesterol_screened))
            .with(
                "EXER_FREQ_WK",
                safe_or(self.exercise_per_week, Self::DEFAULT_EXER_FREQ_WK),
            )
            .with(
                "STRENGTH_FREQ",
                safe_or(self.strength_per_week, Self::DEFAULT_STRENGTH_FREQ),
            )
            .with("INSURED_FLAG", units::flag(self.insured))
            .with(
                "ACTIVITY_TYPE_CODE",
                safe_or(self.activity_type, Self::DEFAULT_ACTIVITY_TYPE_CODE),
            )
            .with("SEX_MALE", sex_male))
    }
}

fn required(value: Option<f64>, field: &'static str) -> ValidationResult<f64> {
    match value {
        Some(v) if !v.is_nan() => Ok(v),
        _ => Err(ValidationError::MissingField { field }),
    }
}

fn positive(value: Option<f64>, field: &'static str) -> ValidationResult<f64> {
    match required(value, field)? {
        v if v > 0.0 => Ok(v),
        _ => Err(ValidationError::MissingField { field }),
    }
}

fn sex_flag(sex: Option<Sex>) -> ValidationResult<f64> {
    match sex {
        Some(s) => Ok(units::flag(s == Sex::Male)),
        None => Err(ValidationError::MissingField { field: "SEX_MALE" }),
    }
}
