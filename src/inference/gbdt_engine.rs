//! GBDT scoring engine
//!
//! Wraps the `gbdt` crate behind [`ScoringEngine`]:
//! - heart: binary model (`binary:logistic`), emits `[1 - p, p]`
//! - glucose: three-class model (`multi:softprob`), emits per-class softmax
//!
//! Each model is loaded on first use and then shared read-only; concurrent
//! projection calls never reload it.
//!
//! Note: the gbdt crate works in `f32` (`ValueType`) and reports class
//! labels as `usize`. Both are handed back as raw tensors and widened by
//! the adapter.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use super::{InferenceError, RawOutputs, RawTensor, ScoringEngine, ScoringResult, LABEL_OUTPUT};
use crate::features::Feed;
use crate::models::ModelName;

/// On-disk model encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// XGBoost JSON dump
    #[default]
    Xgboost,
    /// gbdt-rs native JSON (serde-serialised `GBDT`)
    Native,
}

impl ModelName {
    /// XGBoost objective the exported model was trained with
    fn xgboost_objective(&self) -> &'static str {
        match self {
            ModelName::Heart => "binary:logistic",
            ModelName::Glucose => "multi:softprob",
        }
    }
}

struct ModelSlot {
    path: PathBuf,
    format: ModelFormat,
    model: OnceLock<GBDT>,
}

impl ModelSlot {
    fn new(path: PathBuf, format: ModelFormat) -> Self {
        Self {
            path,
            format,
            model: OnceLock::new(),
        }
    }

    fn get_or_load(&self, model: ModelName) -> ScoringResult<&GBDT> {
        if let Some(loaded) = self.model.get() {
            return Ok(loaded);
        }
        let loaded = load_model(model, &self.path, self.format)?;
        tracing::info!("Loaded {} model from {}", model, self.path.display());
        Ok(self.model.get_or_init(|| loaded))
    }
}

fn load_model(model: ModelName, path: &Path, format: ModelFormat) -> ScoringResult<GBDT> {
    let load_err = |message: String| InferenceError::ModelLoad { model, message };

    let path_str = path
        .to_str()
        .ok_or_else(|| load_err("invalid UTF-8 in model path".to_string()))?;
    if !path.exists() {
        return Err(load_err(format!("model file not found: {}", path.display())));
    }

    match format {
        ModelFormat::Xgboost => GBDT::from_xgboost_dump(path_str, model.xgboost_objective())
            .map_err(|e| load_err(format!("failed to load XGBoost dump: {e}"))),
        ModelFormat::Native => GBDT::load_model(path_str)
            .map_err(|e| load_err(format!("failed to load GBDT model: {e}"))),
    }
}

/// Local, lazily-loaded scoring engine for both models
pub struct GbdtEngine {
    heart: ModelSlot,
    glucose: ModelSlot,
}

impl GbdtEngine {
    pub fn new(heart_path: PathBuf, glucose_path: PathBuf, format: ModelFormat) -> Self {
        Self {
            heart: ModelSlot::new(heart_path, format),
            glucose: ModelSlot::new(glucose_path, format),
        }
    }

    fn slot(&self, model: ModelName) -> &ModelSlot {
        match model {
            ModelName::Heart => &self.heart,
            ModelName::Glucose => &self.glucose,
        }
    }

    pub fn model_path(&self, model: ModelName) -> &Path {
        &self.slot(model).path
    }

    /// Load a model ahead of the first request.
    pub fn preload(&self, model: ModelName) -> ScoringResult<()> {
        self.slot(model).get_or_load(model).map(|_| ())
    }

    pub fn is_loaded(&self, model: ModelName) -> bool {
        self.slot(model).model.get().is_some()
    }
}

/// Flatten a feed into the positional layout the trees were trained on.
fn feed_values(model: ModelName, feed: &Feed) -> ScoringResult<Vec<f32>> {
    let schema = model.feature_order();
    let malformed = |message: String| InferenceError::MalformedFeed { model, message };

    if feed.len() != schema.len() {
        return Err(malformed(format!(
            "expected {} features, got {}",
            schema.len(),
            feed.len()
        )));
    }

    if let Feed::Named(entries) = feed {
        if let Some(((got, _), want)) = entries
            .iter()
            .zip(schema.iter())
            .find(|((got, _), want)| got != *want)
        {
            return Err(malformed(format!("expected input '{want}', got '{got}'")));
        }
    }

    Ok(feed.values())
}

impl ScoringEngine for GbdtEngine {
    fn score(&self, model: ModelName, feed: &Feed) -> ScoringResult<RawOutputs> {
        let values = feed_values(model, feed)?;
        let gbdt = self.slot(model).get_or_load(model)?;
        let data = vec![Data::new_test_data(values, None)];

        match model {
            ModelName::Heart => {
                let p = gbdt
                    .predict(&data)
                    .first()
                    .copied()
                    .ok_or_else(|| InferenceError::Scoring {
                        model,
                        message: "model returned no prediction".to_string(),
                    })?
                    .clamp(0.0, 1.0);
                Ok(RawOutputs::new()
                    .with(LABEL_OUTPUT, RawTensor::I64(vec![i64::from(p >= 0.5)]))
                    .with("probabilities", RawTensor::F32(vec![1.0 - p, p])))
            }
            ModelName::Glucose => {
                let (labels, probs) = gbdt.predict_multiclass(&data, model.class_count());
                let probs = probs.into_iter().next().ok_or_else(|| InferenceError::Scoring {
                    model,
                    message: "model returned no class probabilities".to_string(),
                })?;
                let mut outputs = RawOutputs::new().with("probabilities", RawTensor::F32(probs));
                if let Some(&label) = labels.first() {
                    outputs = outputs.with(LABEL_OUTPUT, RawTensor::I64(vec![label as i64]));
                }
                Ok(outputs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureMap, FeatureVector};
    use crate::inference::run_inference;
    use crate::models::HEART_FEATURE_ORDER;
    use gbdt::config::Config;

    fn heart_row(age: f32, smoker: f32) -> Vec<f32> {
        let mut row = vec![0.0_f32; HEART_FEATURE_ORDER.len()];
        row[0] = age;
        row[1] = 24.0 + age / 10.0;
        row[3] = smoker;
        row[15] = 1.0;
        row
    }

    /// Tiny binary model: older smokers are positive.
    fn train_heart_model() -> GBDT {
        let mut cfg = Config::new();
        cfg.set_feature_size(HEART_FEATURE_ORDER.len());
        cfg.set_max_depth(3);
        cfg.set_iterations(10);
        cfg.set_shrinkage(0.3);
        cfg.set_loss("LogLikelyhood");
        cfg.set_debug(false);
        cfg.set_min_leaf_size(1);

        let mut data: Vec<Data> = (0..40)
            .map(|i| {
                let age = 20.0 + i as f32 * 1.5;
                let smoker = (i % 2) as f32;
                let label = if age > 50.0 && smoker > 0.0 { 1.0 } else { -1.0 };
                Data::new_training_data(heart_row(age, smoker), 1.0, label, None)
            })
            .collect();

        let mut gbdt = GBDT::new(&cfg);
        gbdt.fit(&mut data);
        gbdt
    }

    fn saved_engine() -> (tempfile::TempDir, GbdtEngine) {
        let dir = tempfile::tempdir().unwrap();
        let heart_path = dir.path().join("heart.json");
        train_heart_model()
            .save_model(heart_path.to_str().unwrap())
            .unwrap();
        let engine = GbdtEngine::new(
            heart_path,
            dir.path().join("missing-glucose.json"),
            ModelFormat::Native,
        );
        (dir, engine)
    }

    fn heart_vector(age: f64) -> FeatureVector {
        let map: FeatureMap = HEART_FEATURE_ORDER
            .iter()
            .map(|&name| (name, 0.0))
            .collect::<FeatureMap>()
            .with("AGE", age)
            .with("BMI", 27.0)
            .with("SMOKING_IDX", 1.0)
            .with("SEX_MALE", 1.0);
        FeatureVector::assemble(ModelName::Heart, &map).unwrap()
    }

    #[test]
    fn test_heart_scores_are_probabilities() {
        let (_dir, engine) = saved_engine();
        let result = run_inference(&engine, &heart_vector(60.0)).unwrap();

        assert_eq!(result.probabilities.len(), 2);
        let sum: f64 = result.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        let p = result.positive_probability();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(result.label, Some(if p >= 0.5 { 1.0 } else { 0.0 }));
    }

    #[test]
    fn test_model_is_loaded_once() {
        let (dir, engine) = saved_engine();
        assert!(!engine.is_loaded(ModelName::Heart));

        let first = run_inference(&engine, &heart_vector(45.0)).unwrap();
        assert!(engine.is_loaded(ModelName::Heart));

        std::fs::remove_file(dir.path().join("heart.json")).unwrap();
        let second = run_inference(&engine, &heart_vector(45.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_model_file_is_a_load_error() {
        let (_dir, engine) = saved_engine();
        let err = engine.preload(ModelName::Glucose).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ModelLoad {
                model: ModelName::Glucose,
                ..
            }
        ));
        assert!(!engine.is_loaded(ModelName::Glucose));
    }

    #[test]
    fn test_feed_shape_is_checked() {
        let (_dir, engine) = saved_engine();
        let short = Feed::Tensor(vec![1.0; 7]);
        assert!(matches!(
            engine.score(ModelName::Heart, &short),
            Err(InferenceError::MalformedFeed { .. })
        ));

        let mut entries: Vec<(&'static str, f32)> =
            HEART_FEATURE_ORDER.iter().map(|&n| (n, 0.0)).collect();
        entries.swap(0, 1);
        assert!(matches!(
            engine.score(ModelName::Heart, &Feed::Named(entries)),
            Err(InferenceError::MalformedFeed { .. })
        ));
    }
}
