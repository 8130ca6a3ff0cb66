//! Feature derivation and vector assembly
//!
//! Raw form answers are derived into a [`FeatureMap`] keyed by canonical
//! feature name, then laid out into the [`Feed`] a model consumes:
//! - glucose: one `[1, 7]` float tensor in [`GLUCOSE_FEATURE_ORDER`]
//! - heart: sixteen `[1, 1]` scalars keyed by name, in [`HEART_FEATURE_ORDER`]
//!
//! Every value crosses [`safe_number`] on the way in, so NaN never reaches
//! the scoring engine.

pub mod forms;
pub mod units;

pub use forms::{BodyMeasurements, GlucoseForm, HeartForm, Sex};
pub use units::{bmi, WeightUnit};

use crate::models::{ModelName, GLUCOSE_FEATURE_ORDER, HEART_FEATURE_ORDER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Typical fasting glucose (mg/dL) substituted when none was entered.
pub const DEFAULT_GLUCOSE_MG_DL: f64 = 95.0;

/// Whether `features` lacks a usable fasting glucose and will be assembled
/// with [`DEFAULT_GLUCOSE_MG_DL`].
pub fn needs_glucose_default(features: &FeatureMap) -> bool {
    features.value("GLU") <= 0.0
}

/// Input problems caught before any inference is attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Coerce a possibly-absent or NaN value to a number, falling back to 0.
pub fn safe_number(value: Option<f64>) -> f64 {
    safe_or(value, 0.0)
}

/// Coerce a possibly-absent or NaN value, falling back to `fallback`.
pub fn safe_or(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => fallback,
    }
}

/// Derived features keyed by canonical name.
///
/// This is also the `inputs` half of a persisted prediction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, f64>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw entry, which may be NaN
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Entry passed through [`safe_number`]
    pub fn value(&self, name: &str) -> f64 {
        safe_number(self.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Copy of this map with `AGE` overwritten.
    pub fn with_age(&self, age: f64) -> Self {
        self.clone().with("AGE", age)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Engine-specific layout of one feature vector
#[derive(Debug, Clone, PartialEq)]
pub enum Feed {
    /// A single `[1, N]` tensor; position is bound to the schema
    Tensor(Vec<f32>),
    /// One `[1, 1]` tensor per feature, in schema order
    Named(Vec<(&'static str, f32)>),
}

impl Feed {
    pub fn len(&self) -> usize {
        match self {
            Feed::Tensor(values) => values.len(),
            Feed::Named(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values in feed order
    pub fn values(&self) -> Vec<f32> {
        match self {
            Feed::Tensor(values) => values.clone(),
            Feed::Named(entries) => entries.iter().map(|(_, v)| *v).collect(),
        }
    }
}

/// A feature default substituted during assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultedFeature {
    pub feature: &'static str,
    pub value: f64,
}

/// A validated, fully populated feature vector for one model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub model: ModelName,
    /// Schema features after coercion and defaults
    pub features: FeatureMap,
    pub feed: Feed,
    /// Defaults the caller should disclose (currently only `GLU`)
    pub defaults_used: Vec<DefaultedFeature>,
}

impl FeatureVector {
    /// Validate `features` against `model`'s schema and lay them out.
    ///
    /// Required features must be present and, for `AGE`/`BMI`, positive.
    /// Everything else is coerced with [`safe_number`]. A missing or
    /// non-positive `GLU` becomes [`DEFAULT_GLUCOSE_MG_DL`] and is reported
    /// in `defaults_used`.
    pub fn assemble(model: ModelName, features: &FeatureMap) -> ValidationResult<Self> {
        validate_required(model, features)?;

        let mut defaults_used = Vec::new();
        let mut normalised = FeatureMap::new();

        for &name in model.feature_order() {
            let mut value = features.value(name);
            if name == "GLU" && needs_glucose_default(features) {
                tracing::warn!(
                    "No fasting glucose supplied, using {} mg/dL",
                    DEFAULT_GLUCOSE_MG_DL
                );
                value = DEFAULT_GLUCOSE_MG_DL;
                defaults_used.push(DefaultedFeature {
                    feature: "GLU",
                    value,
                });
            }
            normalised.insert(name, value);
        }

        let feed = match model {
            ModelName::Glucose => Feed::Tensor(
                GLUCOSE_FEATURE_ORDER
                    .iter()
                    .map(|name| normalised.value(name) as f32)
                    .collect(),
            ),
            ModelName::Heart => Feed::Named(
                HEART_FEATURE_ORDER
                    .iter()
                    .map(|&name| (name, normalised.value(name) as f32))
                    .collect(),
            ),
        };

        tracing::debug!("Assembled {} feed: {:?}", model, feed);

        Ok(Self {
            model,
            features: normalised,
            feed,
            defaults_used,
        })
    }

    pub fn used_default(&self, feature: &str) -> bool {
        self.defaults_used.iter().any(|d| d.feature == feature)
    }
}

fn validate_required(model: ModelName, features: &FeatureMap) -> ValidationResult<()> {
    for &name in model.required_features() {
        let value = match features.get(name) {
            Some(v) if !v.is_nan() => v,
            _ => return Err(ValidationError::MissingField { field: name }),
        };
        if (name == "AGE" || name == "BMI") && value <= 0.0 {
            return Err(ValidationError::MissingField { field: name });
        }
    }
    Ok(())
}
