//! Health advice
//!
//! Two sources of advice for a scored result:
//! - [`rules`]: fixed lifestyle tips and personalised key factors, offline
//! - [`HealthCoach`]: an LLM-written action plan and a follow-up chat
//!
//! The LLM text is not parsed or validated beyond being non-empty.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY`: Required for the OpenAI backend (default)
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OLLAMA_MODEL`: Overrides the model for a local Ollama server

mod chat;
mod client;
mod prompts;
pub mod rules;

pub use chat::{ChatSession, HealthCoach, CHAT_WINDOW};
pub use client::{AiClient, AiConfig, LlmBackend, Message, Role, TextGenerator};
pub use prompts::{chat_context, describe_inputs, model_summary, plan_prompt};
pub use rules::{generate_health_advice, key_factors, KeyFactor};

use thiserror::Error;

/// Errors that can occur while generating advice
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("Request to the AI service failed: {0}")]
    Request(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("The AI service returned an empty reply")]
    EmptyReply,
}

pub type AdviceResult<T> = Result<T, AdviceError>;
