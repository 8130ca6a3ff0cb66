//! Prompt text for the AI plan and chat

use crate::features::{needs_glucose_default, FeatureMap, DEFAULT_GLUCOSE_MG_DL};
use crate::inference::InferenceResult;
use crate::models::ModelName;
use crate::risk::{
    classify, classify_glucose, HeartThresholds, RiskCategory, GLUCOSE_CLASS_LABELS,
};
use crate::store::HealthSummary;
use std::fmt::Write;

pub const PLAN_SYSTEM_PROMPT: &str = "You are a certified health coach providing safe, non-diagnostic lifestyle advice.
Return a short, numbered action plan (3-6 points) tailored to the user's health profile and predicted risk category.
Be specific and actionable (diet, exercise, habits, etc.) but avoid medical prescriptions.";

pub const CHAT_SYSTEM_PROMPT: &str = "You are a friendly, empathetic health coach.
You give concise, evidence-based lifestyle advice for diet, exercise, sleep, and stress.
You NEVER diagnose or give medical treatment plans.
You remember the current conversation and reference earlier topics when relevant (e.g. \"As I mentioned earlier\").
Keep replies under 5 sentences unless user asks for detailed lists.";

pub const NO_HEALTH_DATA: &str = "No recent health data found.";

fn number(inputs: &FeatureMap, name: &str) -> String {
    match inputs.get(name) {
        Some(v) if v.is_finite() => v.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Fasting glucose as entered, or a note that the default was assumed
fn glucose_reading(inputs: &FeatureMap) -> String {
    if needs_glucose_default(inputs) {
        format!("not provided (assumed {DEFAULT_GLUCOSE_MG_DL} mg/dL)")
    } else {
        format!("{} mg/dL", number(inputs, "GLU"))
    }
}

fn yes_no(inputs: &FeatureMap, name: &str) -> &'static str {
    if inputs.get(name) == Some(1.0) {
        "Yes"
    } else {
        "No"
    }
}

fn either(inputs: &FeatureMap, name: &str, set: &'static str, unset: &'static str) -> &'static str {
    if inputs.get(name) == Some(1.0) {
        set
    } else {
        unset
    }
}

/// Activity label for the heart form's activity code
fn activity_name(code: f64) -> &'static str {
    match code as i64 {
        1 => "Walking",
        2 => "Running",
        3 => "Cycling",
        4 => "Strength Training",
        10 => "Yoga",
        11 => "Other Activity",
        _ => "None / Unknown",
    }
}

fn smoking_level(level: f64) -> &'static str {
    match level as i64 {
        0 => "Non-smoker",
        1 => "Occasional smoker",
        2 => "Regular smoker",
        _ => "Heavy smoker",
    }
}

/// Plain-text profile of the inputs behind a prediction.
pub fn describe_inputs(inputs: &FeatureMap, model: ModelName) -> String {
    let mut out = String::from("User Profile:\n");
    let _ = writeln!(out, "- Age: {} years old", number(inputs, "AGE"));
    let _ = writeln!(out, "- BMI: {} kg/m²", number(inputs, "BMI"));
    let _ = writeln!(out, "- Sex: {}", either(inputs, "SEX_MALE", "Male", "Female"));

    match model {
        ModelName::Heart => {
            let lines = [
                format!("Physical Activity (any in last 30 days): {}", yes_no(inputs, "PA_ANY")),
                format!("Meets 150-min/week Activity Guideline: {}", yes_no(inputs, "PA_INDEX")),
                format!("Smoking: {}", either(inputs, "SMOKING_IDX", "Smoker", "Non-smoker")),
                format!("Hypertension (high blood pressure): {}", yes_no(inputs, "HTN_FLAG")),
                format!(
                    "Stress: {} days of poor mental health in past 30 days",
                    inputs.value("STRESS_SCORE")
                ),
                format!(
                    "Alcohol Use: {}",
                    either(inputs, "ALC_FLAG", "Heavy drinker", "No heavy drinking")
                ),
                format!(
                    "Cholesterol: {}",
                    either(inputs, "CHOL_FLAG", "High cholesterol", "Normal")
                ),
                format!(
                    "Cholesterol Screening: {}",
                    either(inputs, "CHOL_SCREEN", "Not checked recently", "Checked recently")
                ),
                format!(
                    "Aerobic Exercise Sessions per Week: {}",
                    inputs.value("EXER_FREQ_WK")
                ),
                format!(
                    "Strength Training Sessions per Week: {}",
                    inputs.value("STRENGTH_FREQ")
                ),
                format!("Health Insurance Coverage: {}", yes_no(inputs, "INSURED_FLAG")),
                format!(
                    "Primary Activity Type: {}",
                    activity_name(inputs.value("ACTIVITY_TYPE_CODE"))
                ),
            ];
            for line in lines {
                let _ = writeln!(out, "- {line}");
            }
        }
        ModelName::Glucose => {
            let lines = [
                format!(
                    "Hypertension (high blood pressure): {}",
                    yes_no(inputs, "HTN_FLAG")
                ),
                format!("Fasting Glucose Level: {}", glucose_reading(inputs)),
                format!(
                    "Smoking level: {}",
                    smoking_level(inputs.value("SMOKING_IDX"))
                ),
                format!("Physically Active: {}", yes_no(inputs, "PA_ANY")),
            ];
            for line in lines {
                let _ = writeln!(out, "- {line}");
            }
        }
    }
    out
}

fn category_name(category: Option<RiskCategory>) -> &'static str {
    category.map_or("Unknown", |c| c.as_str())
}

/// Summary of what the model returned; empty for a malformed glucose result.
pub fn model_summary(result: &InferenceResult, category: Option<RiskCategory>) -> String {
    match result.model {
        ModelName::Heart => format!(
            "Model Output Summary:\n\
             - Predicted Heart Risk Category: {}\n\
             - Predicted Probability: {:.1}%\n\
             - The probability represents the likelihood of having heart disease based on the input health data.\n",
            category_name(category),
            result.positive_probability() * 100.0
        ),
        ModelName::Glucose if result.probabilities.len() == GLUCOSE_CLASS_LABELS.len() => {
            let mut out =
                String::from("Model Output Summary:\n- Diabetes Probability Breakdown:\n");
            for (label, p) in GLUCOSE_CLASS_LABELS.iter().zip(&result.probabilities) {
                let _ = writeln!(out, "  * {}: {:.1}%", label, p * 100.0);
            }
            let _ = writeln!(out, "- Predicted Risk Category: {}", category_name(category));
            out.push_str(
                "- The model predicts your current glucose-related condition using age, BMI, \
                 glucose, hypertension, smoking, and activity level.\n",
            );
            out
        }
        ModelName::Glucose => String::new(),
    }
}

/// User prompt asking for a personalised plan.
pub fn plan_prompt(
    inputs: &FeatureMap,
    result: &InferenceResult,
    category: Option<RiskCategory>,
) -> String {
    format!(
        "{}\n{}\nHealth Model Type: {}\nPredicted Category: {}\n\n\
         Create a personalized plan to help improve their health profile, \
         reduce future risk, and explain briefly how their current metrics influence your recommendations.",
        describe_inputs(inputs, result.model),
        model_summary(result, category),
        result.model.title(),
        category_name(category)
    )
}

/// Health summary for the chat, built from the stored records.
pub fn chat_context(summary: &HealthSummary, thresholds: &HeartThresholds) -> String {
    if summary.is_empty() {
        return NO_HEALTH_DATA.to_string();
    }

    let mut out = String::from("### User Health Summary\n");

    if let Some(heart) = &summary.heart {
        let h = &heart.inputs;
        let _ = write!(
            out,
            "\n**Heart Risk**\n\
             - Category: {}\n\
             - Probability: {:.1}%\n\
             - Age: {}, BMI: {}, Hypertension: {}, Active: {}\n",
            category_name(classify(&heart.result, thresholds)),
            heart.result.positive_probability() * 100.0,
            number(h, "AGE"),
            number(h, "BMI"),
            yes_no(h, "HTN_FLAG"),
            yes_no(h, "PA_ANY"),
        );
    }

    if let Some(glucose) = &summary.glucose {
        let g = &glucose.inputs;
        let _ = write!(
            out,
            "\n**Glucose Risk**\n\
             - Category: {}\n\
             - Glucose: {}, BMI: {}, Age: {}, Active: {}\n",
            category_name(classify_glucose(&glucose.result.probabilities)),
            glucose_reading(g),
            number(g, "BMI"),
            number(g, "AGE"),
            yes_no(g, "PA_ANY"),
        );
    }

    out
}
