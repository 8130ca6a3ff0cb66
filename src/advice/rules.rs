//! Rule-based lifestyle advice
//!
//! Every rule reads a derived feature by name and only fires when the
//! feature is present; an absent input never triggers advice.

use crate::features::FeatureMap;
use crate::models::ModelName;
use crate::risk::RiskCategory;
use serde::Serialize;

pub const GENERIC_ADVICE: &str =
    "Maintain your current healthy habits and schedule regular checkups.";

fn is(inputs: &FeatureMap, name: &str, expected: f64) -> bool {
    inputs.get(name) == Some(expected)
}

fn above(inputs: &FeatureMap, name: &str, limit: f64) -> bool {
    inputs.get(name).is_some_and(|v| v > limit)
}

fn below(inputs: &FeatureMap, name: &str, limit: f64) -> bool {
    inputs.get(name).is_some_and(|v| v < limit)
}

/// Tips for one result. Never empty.
///
/// Threshold rules come first; if none fire, the category decides. A
/// result without a category falls through to [`GENERIC_ADVICE`].
pub fn generate_health_advice(
    inputs: &FeatureMap,
    model: ModelName,
    category: Option<RiskCategory>,
) -> Vec<String> {
    let mut advice: Vec<&str> = Vec::new();

    match model {
        ModelName::Heart => {
            if above(inputs, "BMI", 30.0) {
                advice.push("Work toward lowering your BMI below 25 through balanced diet and regular physical activity.");
            }
            if is(inputs, "PA_ANY", 0.0) {
                advice.push("Start light physical activity. Even 20 minutes of brisk walking per day helps your heart.");
            }
            if is(inputs, "SMOKING_IDX", 1.0) {
                advice.push("Quitting smoking dramatically lowers your heart-disease risk within a few months.");
            }
            if is(inputs, "HTN_FLAG", 1.0) {
                advice.push("Monitor blood pressure regularly and limit sodium intake to keep it in check.");
            }
            if is(inputs, "ALC_FLAG", 1.0) {
                advice.push("Try reducing alcohol consumption to improve blood pressure and triglycerides.");
            }
            if is(inputs, "CHOL_FLAG", 1.0) {
                advice.push("Include more fiber (oats, beans) and cut down on saturated fats to manage cholesterol.");
            }

            if advice.is_empty() {
                match category {
                    Some(RiskCategory::Low) => {
                        advice.push("Excellent job! Maintain your current heart-healthy lifestyle.")
                    }
                    Some(RiskCategory::Moderate) => advice.push(
                        "Your heart risk is moderate. Consider improving diet and exercise consistency.",
                    ),
                    Some(RiskCategory::High) => advice.push(
                        "Your heart risk is elevated. Regular checkups and lifestyle management are essential.",
                    ),
                    _ => {}
                }
            }
        }
        ModelName::Glucose => {
            if above(inputs, "BMI", 27.0) {
                advice.push("Aim for gradual weight loss (5-10% of body weight) to improve insulin sensitivity.");
            }
            if is(inputs, "PA_ANY", 0.0) {
                advice.push("Increase daily activity. Even short walks after meals help regulate blood sugar.");
            }
            if is(inputs, "ALC_FLAG", 1.0) {
                advice.push("Limit alcohol to reduce strain on your liver and glucose control.");
            }
            if above(inputs, "STRESS_SCORE", 5.0) {
                advice.push("Manage stress through breathing exercises, sleep, or mindfulness.");
            }

            if advice.is_empty() {
                match category {
                    Some(RiskCategory::Normal) => advice.push(
                        "Great job! Maintain your current healthy habits to keep glucose levels steady.",
                    ),
                    Some(RiskCategory::Prediabetic) => {
                        advice.push("Your glucose levels suggest prediabetes risk. Focus on diet moderation and regular exercise.");
                        advice.push("Avoid sugary drinks and refined carbs. Aim for high-fiber foods and lean proteins.");
                    }
                    Some(RiskCategory::Diabetic) => {
                        advice.push("High diabetes risk detected. Please consult a healthcare provider for testing and management.");
                        advice.push("Adopt a low-glycemic diet and ensure consistent physical activity.");
                    }
                    _ => {}
                }
            }
        }
    }

    if advice.is_empty() {
        advice.push(GENERIC_ADVICE);
    }

    advice.into_iter().map(str::to_string).collect()
}

/// A personalised note about one input that pushes risk up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFactor {
    pub feature: &'static str,
    pub message: String,
}

impl KeyFactor {
    fn new(feature: &'static str, message: impl Into<String>) -> Self {
        Self {
            feature,
            message: message.into(),
        }
    }
}

/// Most key factors shown for one result
pub const MAX_KEY_FACTORS: usize = 6;

/// Factors from `inputs` that currently add to `model`'s risk, in rule
/// order, capped at [`MAX_KEY_FACTORS`].
pub fn key_factors(inputs: &FeatureMap, model: ModelName) -> Vec<KeyFactor> {
    let mut factors = Vec::new();
    let bmi = inputs.value("BMI");

    match model {
        ModelName::Heart => {
            if above(inputs, "AGE", 50.0) {
                factors.push(KeyFactor::new("AGE", "Older age increases cardiovascular risk."));
            }
            if is(inputs, "HTN_FLAG", 1.0) {
                factors.push(KeyFactor::new(
                    "HTN_FLAG",
                    "Managing blood pressure can reduce heart strain.",
                ));
            }
            if is(inputs, "CHOL_FLAG", 1.0) {
                factors.push(KeyFactor::new(
                    "CHOL_FLAG",
                    "High cholesterol may cause plaque buildup in arteries.",
                ));
            }
            if above(inputs, "BMI", 25.0) {
                factors.push(KeyFactor::new(
                    "BMI",
                    format!("Your BMI of {bmi:.1} suggests weight management could improve heart health."),
                ));
            }
            if below(inputs, "EXER_FREQ_WK", 3.0) {
                factors.push(KeyFactor::new(
                    "EXER_FREQ_WK",
                    "Aim for at least 3 sessions of aerobic activity per week.",
                ));
            }
            if below(inputs, "STRENGTH_FREQ", 2.0) {
                factors.push(KeyFactor::new(
                    "STRENGTH_FREQ",
                    "Add strength training twice weekly to support cardiovascular fitness.",
                ));
            }
            if above(inputs, "STRESS_SCORE", 10.0) {
                factors.push(KeyFactor::new(
                    "STRESS_SCORE",
                    "High stress can affect heart rhythm; consider mindfulness or relaxation exercises.",
                ));
            }
            if is(inputs, "SMOKING_IDX", 1.0) {
                factors.push(KeyFactor::new(
                    "SMOKING_IDX",
                    "Smoking greatly increases cardiovascular risk. Quitting helps within weeks.",
                ));
            }
            if is(inputs, "PA_ANY", 0.0) {
                factors.push(KeyFactor::new(
                    "PA_ANY",
                    "Being more active significantly improves heart health.",
                ));
            }
        }
        ModelName::Glucose => {
            if above(inputs, "AGE", 50.0) {
                factors.push(KeyFactor::new(
                    "AGE",
                    "Risk of insulin resistance tends to rise with age. Maintain active lifestyle.",
                ));
            }
            if above(inputs, "BMI", 25.0) {
                factors.push(KeyFactor::new(
                    "BMI",
                    format!("Your BMI of {bmi:.1} suggests that even small weight loss can improve glucose control."),
                ));
            }
            if above(inputs, "GLU", 100.0) {
                factors.push(KeyFactor::new(
                    "GLU",
                    format!(
                        "Fasting glucose {} mg/dL is slightly elevated. Consider monitoring diet and sugar intake.",
                        inputs.value("GLU")
                    ),
                ));
            }
            if is(inputs, "HTN_FLAG", 1.0) {
                factors.push(KeyFactor::new(
                    "HTN_FLAG",
                    "High blood pressure can worsen insulin resistance and diabetes risk.",
                ));
            }
            if above(inputs, "SMOKING_IDX", 0.0) {
                factors.push(KeyFactor::new(
                    "SMOKING_IDX",
                    "Smoking increases inflammation and risk of developing diabetes.",
                ));
            }
            if is(inputs, "PA_ANY", 0.0) {
                factors.push(KeyFactor::new(
                    "PA_ANY",
                    "Regular activity improves insulin sensitivity and helps manage glucose.",
                ));
            }
            if is(inputs, "SEX_MALE", 1.0) {
                factors.push(KeyFactor::new(
                    "SEX_MALE",
                    "Men have slightly higher diabetes risk; regular screening is advised.",
                ));
            }
        }
    }

    factors.truncate(MAX_KEY_FACTORS);
    factors
}
