//! User-level configuration for riskcast
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/riskcast/config.toml

use crate::advice::{AiConfig, LlmBackend};
use crate::inference::gbdt_engine::{GbdtEngine, ModelFormat};
use crate::models::ModelName;
use crate::risk::HeartThresholds;
use crate::store::get_data_dir;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_HEART_FILE: &str = "brfss_heart.json";
pub const DEFAULT_GLUCOSE_FILE: &str = "nhanes_diabetes.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub models: ModelsSection,
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub risk: RiskSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ModelsSection {
    /// Directory holding the model files
    pub dir: Option<PathBuf>,
    pub heart_file: Option<String>,
    pub glucose_file: Option<String>,
    /// "xgboost" (default) or "native"
    pub format: Option<ModelFormat>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AiSection {
    /// "openai" (default), "anthropic" or "ollama"
    pub backend: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub plan_max_tokens: Option<u32>,
    pub chat_max_tokens: Option<u32>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RiskSection {
    pub heart_moderate: Option<f64>,
    pub heart_high: Option<f64>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/riskcast/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = match Self::user_config_path().filter(|p| p.exists()) {
            Some(path) => Self::load_from(&path)?,
            None => UserConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse one config file, without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = UserConfig::default();
        config.merge(
            toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?,
        );
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the user config directory path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("riskcast").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(key);
        }
        if let Some(dir) = std::env::var_os("RISKCAST_MODEL_DIR") {
            self.models.dir = Some(PathBuf::from(dir));
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        let UserConfig { models, ai, risk } = other;

        if models.dir.is_some() {
            self.models.dir = models.dir;
        }
        if models.heart_file.is_some() {
            self.models.heart_file = models.heart_file;
        }
        if models.glucose_file.is_some() {
            self.models.glucose_file = models.glucose_file;
        }
        if models.format.is_some() {
            self.models.format = models.format;
        }

        if ai.backend.is_some() {
            self.ai.backend = ai.backend;
        }
        if ai.model.is_some() {
            self.ai.model = ai.model;
        }
        if ai.temperature.is_some() {
            self.ai.temperature = ai.temperature;
        }
        if ai.plan_max_tokens.is_some() {
            self.ai.plan_max_tokens = ai.plan_max_tokens;
        }
        if ai.chat_max_tokens.is_some() {
            self.ai.chat_max_tokens = ai.chat_max_tokens;
        }
        if ai.openai_api_key.is_some() {
            self.ai.openai_api_key = ai.openai_api_key;
        }
        if ai.anthropic_api_key.is_some() {
            self.ai.anthropic_api_key = ai.anthropic_api_key;
        }

        if risk.heart_moderate.is_some() {
            self.risk.heart_moderate = risk.heart_moderate;
        }
        if risk.heart_high.is_some() {
            self.risk.heart_high = risk.heart_high;
        }
    }

    pub fn models_dir(&self) -> PathBuf {
        self.models
            .dir
            .clone()
            .unwrap_or_else(|| get_data_dir().join("models"))
    }

    pub fn model_path(&self, model: ModelName) -> PathBuf {
        let file = match model {
            ModelName::Heart => self.models.heart_file.as_deref().unwrap_or(DEFAULT_HEART_FILE),
            ModelName::Glucose => self
                .models
                .glucose_file
                .as_deref()
                .unwrap_or(DEFAULT_GLUCOSE_FILE),
        };
        self.models_dir().join(file)
    }

    /// Scoring engine over the configured model files (loaded on first use)
    pub fn scoring_engine(&self) -> GbdtEngine {
        GbdtEngine::new(
            self.model_path(ModelName::Heart),
            self.model_path(ModelName::Glucose),
            self.models.format.unwrap_or_default(),
        )
    }

    pub fn heart_thresholds(&self) -> Result<HeartThresholds> {
        let defaults = HeartThresholds::default();
        let thresholds = HeartThresholds {
            moderate: self.risk.heart_moderate.unwrap_or(defaults.moderate),
            high: self.risk.heart_high.unwrap_or(defaults.high),
        };
        if !thresholds.is_valid() {
            bail!(
                "Invalid [risk] thresholds: need 0 <= heart_moderate ({}) <= heart_high ({}) <= 1",
                thresholds.moderate,
                thresholds.high
            );
        }
        Ok(thresholds)
    }

    pub fn ai_backend(&self) -> Result<LlmBackend> {
        match self.ai.backend.as_deref() {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => Ok(LlmBackend::default()),
        }
    }

    pub fn ai_config(&self) -> Result<AiConfig> {
        let defaults = AiConfig::default();
        Ok(AiConfig {
            backend: self.ai_backend()?,
            model: self.ai.model.clone(),
            temperature: self.ai.temperature.unwrap_or(defaults.temperature),
        })
    }

    /// API key for `backend`, if configured
    pub fn api_key(&self, backend: LlmBackend) -> Option<String> {
        match backend {
            LlmBackend::OpenAi => self.ai.openai_api_key.clone(),
            LlmBackend::Anthropic => self.ai.anthropic_api_key.clone(),
            LlmBackend::Ollama => None,
        }
    }

    pub fn plan_max_tokens(&self) -> u32 {
        self.ai.plan_max_tokens.unwrap_or(1200)
    }

    pub fn chat_max_tokens(&self) -> u32 {
        self.ai.chat_max_tokens.unwrap_or(400)
    }

    /// Initialize user config directory and create example config.
    /// Returns the path and whether the file was created.
    pub fn init_user_config() -> Result<(PathBuf, bool)> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        let created = Self::write_example(&config_path)?;
        Ok((config_path, created))
    }

    /// Write the example config to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn write_example(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

const EXAMPLE_CONFIG: &str = r#"# riskcast User Configuration

[models]
# Directory with the exported models (default: <data dir>/riskcast/models)
# Overridden by RISKCAST_MODEL_DIR
# dir = "/path/to/models"
# heart_file = "brfss_heart.json"
# glucose_file = "nhanes_diabetes.json"
# format = "xgboost"  # or "native"

[ai]
# Backend: "openai" (default), "anthropic" or "ollama" (free, local)
# backend = "openai"
# model = "gpt-4o-mini"
# temperature = 0.7
# plan_max_tokens = 1200
# chat_max_tokens = 400

# Keys can also come from OPENAI_API_KEY / ANTHROPIC_API_KEY
# openai_api_key = "sk-..."
# anthropic_api_key = "sk-ant-..."

[risk]
# Heart probability cut-offs
# heart_moderate = 0.3
# heart_high = 0.6
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.ai_backend().unwrap(), LlmBackend::OpenAi);
        assert_eq!(config.heart_thresholds().unwrap(), HeartThresholds::default());
        assert_eq!(config.plan_max_tokens(), 1200);
        assert_eq!(config.chat_max_tokens(), 400);
        assert!(config.model_path(ModelName::Heart).ends_with(DEFAULT_HEART_FILE));
        assert!(config
            .model_path(ModelName::Glucose)
            .ends_with(DEFAULT_GLUCOSE_FILE));
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[models]
dir = "/opt/models"
heart_file = "heart.json"
format = "native"

[ai]
backend = "anthropic"
temperature = 0.2

[risk]
heart_moderate = 0.25
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.model_path(ModelName::Heart),
            PathBuf::from("/opt/models/heart.json")
        );
        assert_eq!(config.models.format, Some(ModelFormat::Native));

        let ai = config.ai_config().unwrap();
        assert_eq!(ai.backend, LlmBackend::Anthropic);
        assert_eq!(ai.temperature, 0.2);

        let thresholds = config.heart_thresholds().unwrap();
        assert_eq!(thresholds.moderate, 0.25);
        assert_eq!(thresholds.high, 0.6);
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let config: UserConfig = toml::from_str("").unwrap();
        assert!(config.models.dir.is_none());
        assert_eq!(config.ai_backend().unwrap(), LlmBackend::OpenAi);
    }

    #[test]
    fn test_invalid_toml_does_not_crash() {
        let bad_toml = "this is [[ not valid toml {{{}}}";
        assert!(toml::from_str::<UserConfig>(bad_toml).is_err());
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        let config: UserConfig = toml::from_str("[ai]\nbackend = \"gemini\"").unwrap();
        assert!(config.ai_config().is_err());
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let config: UserConfig =
            toml::from_str("[risk]\nheart_moderate = 0.7\nheart_high = 0.4").unwrap();
        assert!(config.heart_thresholds().is_err());
    }

    #[test]
    fn test_merge_overrides_set_fields() {
        let mut base: UserConfig =
            toml::from_str("[ai]\nmodel = \"gpt-4o\"\nopenai_api_key = \"sk-base\"").unwrap();
        let other: UserConfig = toml::from_str("[ai]\nopenai_api_key = \"sk-new\"").unwrap();
        base.merge(other);
        assert_eq!(base.ai.model.as_deref(), Some("gpt-4o"));
        assert_eq!(base.api_key(LlmBackend::OpenAi).as_deref(), Some("sk-new"));
        assert_eq!(base.api_key(LlmBackend::Ollama), None);
    }

    #[test]
    fn test_example_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskcast").join("config.toml");

        assert!(UserConfig::write_example(&path).unwrap());
        assert!(!UserConfig::write_example(&path).unwrap());

        let config = UserConfig::load_from(&path).unwrap();
        assert!(config.ai.backend.is_none());
        assert!(config.risk.heart_high.is_none());
    }

    #[test]
    fn test_user_config_path_returns_some() {
        if let Some(p) = UserConfig::user_config_path() {
            assert!(p.ends_with("riskcast/config.toml"));
        }
    }
}
