//! Core data models for riskcast
//!
//! The closed set of risk models and their fixed feature schemas. Every
//! other module keys its behaviour off [`ModelName`].

use serde::{Deserialize, Serialize};

/// Positional schema of the diabetes model's `[1, 7]` input tensor.
pub const GLUCOSE_FEATURE_ORDER: [&str; 7] = [
    "AGE",
    "BMI",
    "SEX_MALE",
    "HTN_FLAG",
    "SMOKING_IDX",
    "GLU",
    "PA_ANY",
];

/// Named inputs of the heart-disease model, in feed order.
pub const HEART_FEATURE_ORDER: [&str; 16] = [
    "AGE",
    "BMI",
    "PA_ANY",
    "SMOKING_IDX",
    "HTN_FLAG",
    "STRESS_SCORE",
    "PA_INDEX",
    "STRESSxPA",
    "ALC_FLAG",
    "CHOL_FLAG",
    "CHOL_SCREEN",
    "EXER_FREQ_WK",
    "STRENGTH_FREQ",
    "INSURED_FLAG",
    "ACTIVITY_TYPE_CODE",
    "SEX_MALE",
];

/// Which trained classifier a request targets
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    /// Binary heart-disease classifier (BRFSS)
    Heart,
    /// Three-class diabetes classifier (NHANES)
    Glucose,
}

impl ModelName {
    pub const ALL: [ModelName; 2] = [ModelName::Heart, ModelName::Glucose];

    /// Canonical feature names in the order the model consumes them
    pub fn feature_order(&self) -> &'static [&'static str] {
        match self {
            ModelName::Heart => &HEART_FEATURE_ORDER,
            ModelName::Glucose => &GLUCOSE_FEATURE_ORDER,
        }
    }

    /// Features that can never be defaulted; assembly fails without them.
    pub fn required_features(&self) -> &'static [&'static str] {
        match self {
            ModelName::Heart => &["AGE", "BMI", "SEX_MALE", "PA_ANY", "PA_INDEX"],
            ModelName::Glucose => &["AGE", "BMI", "SEX_MALE"],
        }
    }

    /// Number of output classes
    pub fn class_count(&self) -> usize {
        match self {
            ModelName::Heart => 2,
            ModelName::Glucose => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ModelName::Heart => "Heart Disease Risk",
            ModelName::Glucose => "Diabetes Risk",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Heart => "heart",
            ModelName::Glucose => "glucose",
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heart" => Ok(ModelName::Heart),
            "glucose" | "diabetes" => Ok(ModelName::Glucose),
            other => Err(format!("unknown model '{other}' (expected heart or glucose)")),
        }
    }
}
