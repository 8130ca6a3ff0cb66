//! riskcast - local heart-disease and diabetes risk estimation
//!
//! Questionnaire answers are derived into a fixed feature schema per model,
//! scored by a read-only gradient-boosted model, banded into risk
//! categories and projected forward in age.
//!
//! ```text
//! form ─► features ─► FeatureVector ─► ScoringEngine ─► InferenceResult ─► RiskCategory
//!                          └────────── projection (AGE, +5, +10) ──────────┘
//! ```

pub mod advice;
pub mod config;
pub mod features;
pub mod inference;
pub mod models;
pub mod projection;
pub mod risk;
pub mod store;
