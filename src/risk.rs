//! Risk categories
//!
//! Heart results are banded by fixed probability thresholds; glucose
//! results take the class with the highest probability. Both are pure
//! functions of an [`InferenceResult`].

use crate::inference::InferenceResult;
use crate::models::ModelName;
use serde::{Deserialize, Serialize};

/// Ordinal risk band for either model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Normal,
    Prediabetic,
    Diabetic,
}

/// Glucose class labels in the model's output order
pub const GLUCOSE_CLASS_LABELS: [RiskCategory; 3] = [
    RiskCategory::Normal,
    RiskCategory::Prediabetic,
    RiskCategory::Diabetic,
];

/// How a category should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Caution,
    Alert,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
            RiskCategory::Normal => "Normal",
            RiskCategory::Prediabetic => "Prediabetic",
            RiskCategory::Diabetic => "Diabetic",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            RiskCategory::Low | RiskCategory::Normal => Tone::Good,
            RiskCategory::Moderate | RiskCategory::Prediabetic => Tone::Caution,
            RiskCategory::High | RiskCategory::Diabetic => Tone::Alert,
        }
    }

    /// One-line message shown with the result
    pub fn headline(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Great job! Your predicted heart disease risk is low. Keep maintaining a healthy lifestyle!",
            RiskCategory::Moderate => "Your predicted heart risk is moderate. Consider regular check-ups and staying active.",
            RiskCategory::High => "Your predicted heart disease risk is high. Please consult a healthcare provider for further evaluation.",
            RiskCategory::Normal => "Your predicted glucose level is within a healthy range!",
            RiskCategory::Prediabetic => "You may be at risk for prediabetes. Watch your diet and activity level closely.",
            RiskCategory::Diabetic => "High diabetes risk detected. Consider consulting your doctor for tests and lifestyle adjustments.",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probability cut-offs for the heart model
///
/// A value on a boundary belongs to the higher band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartThresholds {
    /// Lowest probability rated Moderate
    pub moderate: f64,
    /// Lowest probability rated High
    pub high: f64,
}

impl Default for HeartThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.3,
            high: 0.6,
        }
    }
}

impl HeartThresholds {
    pub fn classify(&self, probability: f64) -> RiskCategory {
        if probability < self.moderate {
            RiskCategory::Low
        } else if probability < self.high {
            RiskCategory::Moderate
        } else {
            RiskCategory::High
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.moderate)
            && (0.0..=1.0).contains(&self.high)
            && self.moderate <= self.high
    }
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Glucose category, if the model produced exactly three class probabilities.
pub fn classify_glucose(probabilities: &[f64]) -> Option<RiskCategory> {
    if probabilities.len() != GLUCOSE_CLASS_LABELS.len() {
        return None;
    }
    argmax(probabilities).map(|i| GLUCOSE_CLASS_LABELS[i])
}

/// Category for any result
pub fn classify(result: &InferenceResult, thresholds: &HeartThresholds) -> Option<RiskCategory> {
    match result.model {
        ModelName::Heart => Some(thresholds.classify(result.positive_probability())),
        ModelName::Glucose => classify_glucose(&result.probabilities),
    }
}

/// The headline numbers for one result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub model: ModelName,
    pub category: Option<RiskCategory>,
    /// Heart: positive-class probability. Glucose: probability of the winning class.
    pub probability: f64,
}

impl RiskSummary {
    pub fn from_result(result: &InferenceResult, thresholds: &HeartThresholds) -> Self {
        let category = classify(result, thresholds);
        let probability = match result.model {
            ModelName::Heart => result.positive_probability(),
            ModelName::Glucose => argmax(&result.probabilities)
                .and_then(|i| result.probabilities.get(i).copied())
                .unwrap_or(0.0),
        };
        Self {
            model: result.model,
            category,
            probability,
        }
    }

    /// Probability as a percentage with one decimal, e.g. `"42.5"`
    pub fn percent(&self) -> String {
        format!("{:.1}", self.probability * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glucose(probs: &[f64]) -> InferenceResult {
        InferenceResult {
            model: ModelName::Glucose,
            label: None,
            probabilities: probs.to_vec(),
            raw_probability: None,
        }
    }

    #[test]
    fn test_heart_boundaries() {
        let t = HeartThresholds::default();
        assert_eq!(t.classify(0.29999), RiskCategory::Low);
        assert_eq!(t.classify(0.3), RiskCategory::Moderate);
        assert_eq!(t.classify(0.59999), RiskCategory::Moderate);
        assert_eq!(t.classify(0.6), RiskCategory::High);
        assert_eq!(t.classify(0.0), RiskCategory::Low);
        assert_eq!(t.classify(1.0), RiskCategory::High);
    }

    #[test]
    fn test_glucose_argmax() {
        assert_eq!(
            classify_glucose(&[0.5, 0.3, 0.2]),
            Some(RiskCategory::Normal)
        );
        assert_eq!(
            classify_glucose(&[0.2, 0.2, 0.6]),
            Some(RiskCategory::Diabetic)
        );
        assert_eq!(
            classify_glucose(&[0.4, 0.4, 0.2]),
            Some(RiskCategory::Normal)
        );
        assert_eq!(
            classify_glucose(&[0.1, 0.45, 0.45]),
            Some(RiskCategory::Prediabetic)
        );
    }

    #[test]
    fn test_glucose_needs_three_classes() {
        assert_eq!(classify_glucose(&[]), None);
        assert_eq!(classify_glucose(&[0.3, 0.7]), None);
    }

    #[test]
    fn test_argmax_skips_leading_nan() {
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_classify_heart_result() {
        let result = InferenceResult {
            model: ModelName::Heart,
            label: Some(1.0),
            probabilities: vec![0.35, 0.65],
            raw_probability: Some(0.65),
        };
        let t = HeartThresholds::default();
        assert_eq!(classify(&result, &t), Some(RiskCategory::High));

        let summary = RiskSummary::from_result(&result, &t);
        assert_eq!(summary.percent(), "65.0");
        assert_eq!(summary.category.map(|c| c.tone()), Some(Tone::Alert));
    }

    #[test]
    fn test_glucose_summary_uses_winning_class() {
        let summary =
            RiskSummary::from_result(&glucose(&[0.2, 0.7, 0.1]), &HeartThresholds::default());
        assert_eq!(summary.category, Some(RiskCategory::Prediabetic));
        assert_eq!(summary.percent(), "70.0");
    }

    #[test]
    fn test_custom_thresholds() {
        let t = HeartThresholds {
            moderate: 0.2,
            high: 0.5,
        };
        assert!(t.is_valid());
        assert_eq!(t.classify(0.25), RiskCategory::Moderate);
        assert!(!HeartThresholds {
            moderate: 0.7,
            high: 0.5
        }
        .is_valid());
    }

    #[test]
    fn test_headlines_match_tone() {
        assert!(RiskCategory::Low.headline().contains("low"));
        assert_eq!(RiskCategory::Prediabetic.tone(), Tone::Caution);
        assert_eq!(RiskCategory::Diabetic.to_string(), "Diabetic");
    }
}
