//! Age-forward risk projection
//!
//! Re-scores the same inputs at the current age, +5 and +10 years. The
//! three calls are independent and run in parallel; the output always
//! follows ascending offset. A failed call leaves its point without a
//! value instead of failing the projection.

use crate::features::units::round_to;
use crate::features::{FeatureMap, FeatureVector};
use crate::inference::{run_inference, InferenceResult, ScoringEngine};
use crate::models::ModelName;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Years added to the current age for each projection point
pub const PROJECTION_OFFSETS: [u32; 3] = [0, 5, 10];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Cannot project without a current age")]
    MissingAge,
}

/// Risk at one synthetic age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// "Current" for offset 0, otherwise "Age N"
    pub label: String,
    pub age: f64,
    /// Risk as a percentage with one decimal; `None` if scoring failed
    pub risk_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub model: ModelName,
    pub points: Vec<ProjectionPoint>,
}

impl Projection {
    /// Points whose inference call failed
    pub fn failed_points(&self) -> impl Iterator<Item = &ProjectionPoint> {
        self.points.iter().filter(|p| p.risk_percent.is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.failed_points().next().is_none()
    }
}

/// The single probability tracked over time.
///
/// Heart: positive-class probability. Glucose: the Diabetic class
/// probability (index 2), regardless of which class won.
pub fn tracked_probability(result: &InferenceResult) -> f64 {
    match result.model {
        ModelName::Heart => result.positive_probability(),
        ModelName::Glucose => result.probabilities.get(2).copied().unwrap_or(0.0),
    }
}

fn point_label(offset: u32, age: f64) -> String {
    if offset == 0 {
        "Current".to_string()
    } else if age.fract() == 0.0 {
        format!("Age {}", age as i64)
    } else {
        format!("Age {age}")
    }
}

/// Project `model`'s risk for `inputs` over [`PROJECTION_OFFSETS`].
///
/// `inputs` is the derived feature map of the current prediction; only
/// `AGE` changes between points.
pub fn project(
    engine: &dyn ScoringEngine,
    model: ModelName,
    inputs: &FeatureMap,
) -> Result<Projection, ProjectionError> {
    let current_age = match inputs.get("AGE") {
        Some(age) if age > 0.0 => age,
        _ => return Err(ProjectionError::MissingAge),
    };

    let points: Vec<ProjectionPoint> = PROJECTION_OFFSETS
        .par_iter()
        .map(|&offset| {
            let age = current_age + f64::from(offset);
            let risk_percent = score_at_age(engine, model, inputs, age);
            ProjectionPoint {
                label: point_label(offset, age),
                age,
                risk_percent,
            }
        })
        .collect();

    Ok(Projection { model, points })
}

fn score_at_age(
    engine: &dyn ScoringEngine,
    model: ModelName,
    inputs: &FeatureMap,
    age: f64,
) -> Option<f64> {
    let vector = match FeatureVector::assemble(model, &inputs.with_age(age)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Skipping {} projection at age {}: {}", model, age, e);
            return None;
        }
    };
    match run_inference(engine, &vector) {
        Ok(result) => Some(round_to(tracked_probability(&result) * 100.0, 1)),
        Err(e) => {
            tracing::warn!("Projection point at age {} failed: {}", age, e);
            None
        }
    }
}

/// Identifies one request issued through a [`RequestGate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Tracks the latest request so stale results can be dropped.
///
/// Call [`RequestGate::begin`] when a new prediction or projection starts
/// and check the ticket before applying its result.
#[derive(Debug, Default)]
pub struct RequestGate {
    current: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any in flight.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `value` in `slot` only if `ticket` is still the latest request.
    pub fn apply<T>(&self, ticket: RequestTicket, slot: &mut Option<T>, value: T) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("Dropping stale result for request {}", ticket.0);
            return false;
        }
        *slot = Some(value);
        true
    }
}
