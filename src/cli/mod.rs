//! CLI command definitions and handlers

mod advice;
mod chat;
mod init;
mod predict;
mod records;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use riskcast::config::UserConfig;
use riskcast::features::{FeatureMap, GlucoseForm, HeartForm};
use riskcast::models::ModelName;
use riskcast::store::{HealthStore, PredictionRecord};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// riskcast - local heart and diabetes risk estimates
///
/// Models run on this machine. Only the optional AI plan and chat send
/// your profile to the configured LLM provider.
#[derive(Parser, Debug)]
#[command(name = "riskcast")]
#[command(
    version,
    about = "Local heart-disease and diabetes risk estimates with age-forward projections",
    after_help = "\
Examples:
  riskcast init                               Write an example config file
  riskcast predict heart -i heart.toml        Score a heart questionnaire
  riskcast predict glucose -i glucose.json    Score a diabetes questionnaire
  riskcast project glucose                    Re-project the last stored result
  riskcast advice heart                       Lifestyle tips for the last result
  riskcast plan heart                         AI-written action plan
  riskcast chat                               Chat with the health coach"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes priority
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    /// Directory for stored results
    #[arg(long, global = true, env = "RISKCAST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create ~/.config/riskcast/config.toml with example settings
    Init,

    /// Score a questionnaire and show risk, projection and advice
    #[command(after_help = "\
Examples:
  riskcast predict heart -i heart.toml              Score and store the result
  riskcast predict glucose -i form.json --no-save   Score without storing
  riskcast predict heart -i heart.toml -f json      JSON output for scripting")]
    Predict {
        /// Model to run
        model: ModelName,

        /// Questionnaire file (.json or .toml)
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Do not store the result
        #[arg(long)]
        no_save: bool,

        /// Skip the age-forward projection
        #[arg(long)]
        no_project: bool,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Project risk at the current age, +5 and +10 years
    Project {
        model: ModelName,

        /// Questionnaire file; defaults to the last stored inputs
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Rule-based tips and key factors for the last stored result
    Advice {
        model: ModelName,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// AI-written action plan for the last stored result
    Plan { model: ModelName },

    /// Chat with the AI health coach about your stored results
    Chat {
        /// Send one message and exit instead of starting a session
        #[arg(long, short = 'm')]
        message: Option<String>,
    },

    /// Show stored results
    Show {
        /// Only this model
        model: Option<ModelName>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Delete stored results
    Clear {
        /// Only this model (default: both)
        model: Option<ModelName>,
    },
}

/// Config and store shared by every command
pub(crate) struct AppContext {
    pub config: UserConfig,
    pub store: HealthStore,
}

impl AppContext {
    fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = UserConfig::load()?;
        let store = match data_dir {
            Some(dir) => HealthStore::new(dir),
            None => HealthStore::open_default(),
        };
        Ok(Self { config, store })
    }

    /// Last stored record for `model`, or an error telling the user how to get one
    pub fn require_record(&self, model: ModelName) -> Result<PredictionRecord> {
        self.store
            .load(model)
            .with_context(|| format!("Failed to read stored {model} result"))?
            .with_context(|| {
                format!("No stored {model} result. Run `riskcast predict {model} -i <file>` first")
            })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        return init::run();
    }

    let ctx = AppContext::load(cli.data_dir)?;

    match cli.command {
        Commands::Init => init::run(),
        Commands::Predict {
            model,
            input,
            no_save,
            no_project,
            format,
        } => predict::run(&ctx, model, &input, !no_save, !no_project, format == "json"),
        Commands::Project {
            model,
            input,
            format,
        } => predict::run_projection(&ctx, model, input.as_deref(), format == "json"),
        Commands::Advice { model, format } => advice::run(&ctx, model, format == "json"),
        Commands::Plan { model } => advice::run_plan(&ctx, model),
        Commands::Chat { message } => chat::run(&ctx, message),
        Commands::Show { model, format } => records::show(&ctx, model, format == "json"),
        Commands::Clear { model } => records::clear(&ctx, model),
    }
}

/// Read a questionnaire for `model` and derive its features.
pub(crate) fn read_features(model: ModelName, path: &Path) -> Result<FeatureMap> {
    let features = match model {
        ModelName::Heart => read_form::<HeartForm>(path)?.features(),
        ModelName::Glucose => read_form::<GlucoseForm>(path)?.features(),
    };
    features.with_context(|| format!("Invalid {} questionnaire {}", model, path.display()))
}

fn read_form<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

/// Spinner on stderr; hidden for machine-readable output
pub(crate) fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
