//! Configuration module for riskcast
//!
//! This module handles:
//! - Model file locations
//! - AI backend selection
//! - Heart risk thresholds

mod user_config;

pub use user_config::{
    AiSection, ModelsSection, RiskSection, UserConfig, DEFAULT_GLUCOSE_FILE, DEFAULT_HEART_FILE,
};
