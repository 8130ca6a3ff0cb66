//! Last-result persistence
//!
//! Keeps the most recent `{inputs, result}` pair per model as JSON, plus a
//! combined health summary that the chat context reads from.
//!
//! Layout under the data directory:
//! - `heart_risk.json`, `glucose_risk.json`
//! - `health_summary.json`

pub mod paths;

pub use paths::{get_data_dir, record_path, summary_path};

use crate::features::FeatureMap;
use crate::inference::InferenceResult;
use crate::models::ModelName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One prediction as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub inputs: FeatureMap,
    pub result: InferenceResult,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(inputs: FeatureMap, result: InferenceResult) -> Self {
        Self {
            inputs,
            result,
            saved_at: Utc::now(),
        }
    }

    pub fn model(&self) -> ModelName {
        self.result.model
    }
}

/// Latest record for each model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    #[serde(default)]
    pub heart: Option<PredictionRecord>,
    #[serde(default)]
    pub glucose: Option<PredictionRecord>,
}

impl HealthSummary {
    pub fn get(&self, model: ModelName) -> Option<&PredictionRecord> {
        match model {
            ModelName::Heart => self.heart.as_ref(),
            ModelName::Glucose => self.glucose.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heart.is_none() && self.glucose.is_none()
    }
}

/// JSON-file store rooted at one directory
#[derive(Debug, Clone)]
pub struct HealthStore {
    dir: PathBuf,
}

impl HealthStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the per-user data directory
    pub fn open_default() -> Self {
        Self::new(get_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Last stored record for `model`, if any
    pub fn load(&self, model: ModelName) -> StoreResult<Option<PredictionRecord>> {
        read_json(&record_path(&self.dir, model))
    }

    /// Replace the record for its model and refresh the summary.
    pub fn save(&self, record: &PredictionRecord) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let model = record.model();
        write_json(&record_path(&self.dir, model), record)?;
        self.write_summary()?;
        tracing::debug!("Saved {} record to {}", model, self.dir.display());
        Ok(())
    }

    /// Remove the record for `model` and its summary entry.
    pub fn clear(&self, model: ModelName) -> StoreResult<bool> {
        let path = record_path(&self.dir, model);
        let existed = path.exists();
        if existed {
            std::fs::remove_file(&path)?;
        }
        if self.dir.exists() {
            self.write_summary()?;
        }
        Ok(existed)
    }

    /// Combined summary of both models.
    ///
    /// Reads `health_summary.json`; a store written without one is
    /// summarised from the per-model records.
    pub fn summary(&self) -> StoreResult<HealthSummary> {
        match read_json(&summary_path(&self.dir))? {
            Some(summary) => Ok(summary),
            None => self.collect_summary(),
        }
    }

    fn collect_summary(&self) -> StoreResult<HealthSummary> {
        Ok(HealthSummary {
            heart: self.load(ModelName::Heart)?,
            glucose: self.load(ModelName::Glucose)?,
        })
    }

    fn write_summary(&self) -> StoreResult<()> {
        let summary = self.collect_summary()?;
        write_json(&summary_path(&self.dir), &summary)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> StoreResult<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heart_record(p: f64) -> PredictionRecord {
        PredictionRecord::new(
            FeatureMap::new().with("AGE", 50.0).with("BMI", 28.0),
            InferenceResult {
                model: ModelName::Heart,
                label: Some(0.0),
                probabilities: vec![1.0 - p, p],
                raw_probability: Some(p),
            },
        )
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = HealthStore::new(dir.path());
        assert_eq!(store.load(ModelName::Heart).unwrap(), None);
        assert!(store.summary().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = HealthStore::new(dir.path().join("nested"));

        store.save(&heart_record(0.2)).unwrap();
        store.save(&heart_record(0.7)).unwrap();

        let loaded = store.load(ModelName::Heart).unwrap().unwrap();
        assert_eq!(loaded.result.raw_probability, Some(0.7));
        assert_eq!(loaded.inputs.get("AGE"), Some(50.0));

        let summary: HealthSummary = serde_json::from_str(
            &std::fs::read_to_string(summary_path(store.dir())).unwrap(),
        )
        .unwrap();
        assert!(summary.heart.is_some());
        assert!(summary.glucose.is_none());
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(heart_record(0.4)).unwrap();
        assert_eq!(json["inputs"]["AGE"], 50.0);
        assert_eq!(json["result"]["type"], "heart");
    }

    #[test]
    fn test_clear_removes_record_and_summary_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = HealthStore::new(dir.path());
        store.save(&heart_record(0.5)).unwrap();

        assert!(store.clear(ModelName::Heart).unwrap());
        assert!(!store.clear(ModelName::Heart).unwrap());
        assert!(store.summary().unwrap().heart.is_none());
    }

    #[test]
    fn test_summary_is_read_from_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = HealthStore::new(dir.path());
        store.save(&heart_record(0.45)).unwrap();

        // Only the summary file is left; it still answers
        std::fs::remove_file(record_path(dir.path(), ModelName::Heart)).unwrap();
        let summary = store.summary().unwrap();
        assert_eq!(
            summary.get(ModelName::Heart).unwrap().result.raw_probability,
            Some(0.45)
        );
        assert_eq!(store.load(ModelName::Heart).unwrap(), None);

        // Without a summary file the per-model records are used
        std::fs::remove_file(summary_path(dir.path())).unwrap();
        store.save(&heart_record(0.1)).unwrap();
        std::fs::remove_file(summary_path(dir.path())).unwrap();
        assert!(store.summary().unwrap().heart.is_some());
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = HealthStore::new(dir.path());
        std::fs::write(record_path(dir.path(), ModelName::Glucose), "{not json").unwrap();
        assert!(matches!(
            store.load(ModelName::Glucose),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
