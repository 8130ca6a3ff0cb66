//! Inference adapter
//!
//! The scoring engine is a black box behind [`ScoringEngine`]: it takes a
//! [`Feed`] and returns named raw tensors in whatever numeric type its
//! runtime produced. [`InferenceResult::from_outputs`] is the only place
//! that looks at those raw shapes; everything downstream works with the
//! normalised record.

pub mod gbdt_engine;

pub use gbdt_engine::GbdtEngine;

use crate::features::{Feed, FeatureVector};
use crate::models::ModelName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Output holding the predicted class
pub const LABEL_OUTPUT: &str = "label";

/// Accepted names for the class-probability output, in lookup order
pub const PROBABILITY_OUTPUTS: [&str; 2] = ["probabilities", "probs"];

/// Errors raised by the scoring engine
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to load {model} model: {message}")]
    ModelLoad { model: ModelName, message: String },

    #[error("Feed rejected by {model} model: {message}")]
    MalformedFeed { model: ModelName, message: String },

    #[error("Scoring failed for {model} model: {message}")]
    Scoring { model: ModelName, message: String },
}

pub type ScoringResult<T> = Result<T, InferenceError>;

/// Opaque scoring function over one model's feed.
///
/// Implementations must be safe to share across threads; projection runs
/// several calls at once against the same engine.
pub trait ScoringEngine: Send + Sync {
    fn score(&self, model: ModelName, feed: &Feed) -> ScoringResult<RawOutputs>;
}

/// A raw output tensor, tagged with the runtime's element type
#[derive(Debug, Clone, PartialEq)]
pub enum RawTensor {
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Integer outputs, typically class labels
    I64(Vec<i64>),
}

impl RawTensor {
    /// Elements widened or narrowed to `f64`
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            RawTensor::F32(v) => v.iter().map(|&x| x as f64).collect(),
            RawTensor::F64(v) => v.clone(),
            RawTensor::I64(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }

    pub fn first(&self) -> Option<f64> {
        self.to_f64().first().copied()
    }

    pub fn len(&self) -> usize {
        match self {
            RawTensor::F32(v) => v.len(),
            RawTensor::F64(v) => v.len(),
            RawTensor::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named outputs of one scoring call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutputs {
    tensors: HashMap<String, RawTensor>,
}

impl RawOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, tensor: RawTensor) -> Self {
        self.tensors.insert(name.into(), tensor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawTensor> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }
}

/// Normalised model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    #[serde(rename = "type")]
    pub model: ModelName,
    /// Predicted class, if the model emitted one
    pub label: Option<f64>,
    /// Class probabilities in the model's fixed class order
    pub probabilities: Vec<f64>,
    /// Positive-class probability (binary models only)
    pub raw_probability: Option<f64>,
}

impl InferenceResult {
    /// Normalise raw engine outputs.
    ///
    /// Missing outputs are not errors: an absent label becomes `None` and
    /// absent probabilities an empty sequence.
    pub fn from_outputs(model: ModelName, outputs: &RawOutputs) -> Self {
        let label = outputs.get(LABEL_OUTPUT).and_then(RawTensor::first);
        let probabilities = PROBABILITY_OUTPUTS
            .iter()
            .find_map(|name| outputs.get(name))
            .map(RawTensor::to_f64)
            .unwrap_or_default();

        let raw_probability = match model {
            ModelName::Heart => Some(positive_class_probability(&probabilities)),
            ModelName::Glucose => None,
        };

        Self {
            model,
            label,
            probabilities,
            raw_probability,
        }
    }

    /// Probability of the class of interest for a binary model.
    pub fn positive_probability(&self) -> f64 {
        self.raw_probability
            .unwrap_or_else(|| positive_class_probability(&self.probabilities))
    }
}

/// Second entry when there are two or more, else the first, else 0.
pub fn positive_class_probability(probabilities: &[f64]) -> f64 {
    probabilities
        .get(1)
        .or_else(|| probabilities.first())
        .copied()
        .unwrap_or(0.0)
}

/// Score an assembled vector and normalise the result.
pub fn run_inference(
    engine: &dyn ScoringEngine,
    vector: &FeatureVector,
) -> ScoringResult<InferenceResult> {
    let outputs = engine.score(vector.model, &vector.feed)?;
    tracing::debug!(
        "{} model outputs: {:?}",
        vector.model,
        outputs.names().collect::<Vec<_>>()
    );
    let result = InferenceResult::from_outputs(vector.model, &outputs);
    tracing::debug!("{} model result: {:?}", vector.model, result);
    Ok(result)
}


#[cfg(test)]
mod tests {
    use super::testing::FixedEngine;
    use super::*;
    use crate::features::FeatureMap;

    fn glucose_vector() -> FeatureVector {
        let map = FeatureMap::new()
            .with("AGE", 40.0)
            .with("BMI", 25.0)
            .with("SEX_MALE", 0.0)
            .with("GLU", 100.0);
        FeatureVector::assemble(ModelName::Glucose, &map).unwrap()
    }

    #[test]
    fn test_integer_labels_become_floats() {
        let outputs = RawOutputs::new()
            .with("label", RawTensor::I64(vec![2]))
            .with("probabilities", RawTensor::F32(vec![0.1, 0.2, 0.7]));
        let result = InferenceResult::from_outputs(ModelName::Glucose, &outputs);
        assert_eq!(result.label, Some(2.0));
        assert_eq!(result.probabilities.len(), 3);
        assert!((result.probabilities[2] - 0.7).abs() < 1e-6);
        assert_eq!(result.raw_probability, None);
    }

    #[test]
    fn test_probs_alias_is_accepted() {
        let outputs = RawOutputs::new().with("probs", RawTensor::F64(vec![0.25, 0.75]));
        let result = InferenceResult::from_outputs(ModelName::Heart, &outputs);
        assert_eq!(result.label, None);
        assert_eq!(result.raw_probability, Some(0.75));
    }

    #[test]
    fn test_missing_outputs_are_tolerated() {
        let result = InferenceResult::from_outputs(ModelName::Heart, &RawOutputs::new());
        assert_eq!(result.label, None);
        assert!(result.probabilities.is_empty());
        assert_eq!(result.raw_probability, Some(0.0));
    }

    #[test]
    fn test_positive_class_fallbacks() {
        assert_eq!(positive_class_probability(&[0.4, 0.6]), 0.6);
        assert_eq!(positive_class_probability(&[0.35]), 0.35);
        assert_eq!(positive_class_probability(&[]), 0.0);
    }

    #[test]
    fn test_run_inference_forwards_feed() {
        let engine = FixedEngine::new(
            RawOutputs::new().with("probabilities", RawTensor::F32(vec![0.5, 0.3, 0.2])),
        );
        let vector = glucose_vector();
        let result = run_inference(&engine, &vector).unwrap();
        assert_eq!(result.model, ModelName::Glucose);

        let feeds = engine.feeds.lock().unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0], vector.feed);
        assert!(feeds[0].values().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_result_serializes_with_type_tag() {
        let result = InferenceResult {
            model: ModelName::Heart,
            label: Some(1.0),
            probabilities: vec![0.2, 0.8],
            raw_probability: Some(0.8),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "heart");
        assert_eq!(json["probabilities"][1], 0.8);
    }
}
