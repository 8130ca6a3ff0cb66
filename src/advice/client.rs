//! Chat-completion client for the health coach
//!
//! Talks to OpenAI-compatible endpoints (OpenAI, local Ollama) and to the
//! Anthropic messages API over ureq, so no async runtime is needed.

use super::{AdviceError, AdviceResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    OpenAi,
    Anthropic,
    Ollama,
}

/// Request/response shape spoken by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    ChatCompletions,
    AnthropicMessages,
}

/// Static facts about one backend
struct Endpoint {
    url: &'static str,
    /// Env var holding the API key; `None` for keyless local servers
    key_var: Option<&'static str>,
    key_help: &'static str,
    default_model: &'static str,
    wire: Wire,
}

impl LlmBackend {
    fn endpoint(&self) -> Endpoint {
        match self {
            LlmBackend::OpenAi => Endpoint {
                url: "https://api.openai.com/v1/chat/completions",
                key_var: Some("OPENAI_API_KEY"),
                key_help: "https://platform.openai.com/api-keys",
                default_model: "gpt-4o-mini",
                wire: Wire::ChatCompletions,
            },
            LlmBackend::Anthropic => Endpoint {
                url: "https://api.anthropic.com/v1/messages",
                key_var: Some("ANTHROPIC_API_KEY"),
                key_help: "https://console.anthropic.com/settings/keys",
                default_model: "claude-sonnet-4-20250514",
                wire: Wire::AnthropicMessages,
            },
            LlmBackend::Ollama => Endpoint {
                url: "http://localhost:11434/v1/chat/completions",
                key_var: None,
                key_help: "",
                default_model: "llama3.1:8b",
                wire: Wire::ChatCompletions,
            },
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.endpoint().default_model
    }

    pub fn requires_api_key(&self) -> bool {
        self.endpoint().key_var.is_some()
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmBackend::OpenAi),
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(format!(
                "unknown AI backend '{other}' (expected openai, anthropic or ollama)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Anything that can turn a conversation into a reply
pub trait TextGenerator {
    fn generate(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        max_tokens: u32,
    ) -> AdviceResult<String>;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    /// Overrides the backend's default model
    pub model: Option<String>,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            temperature: 0.7,
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// [`TextGenerator`] backed by a hosted or local LLM
pub struct AiClient {
    config: AiConfig,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl AiClient {
    /// Build a client, taking the API key from `api_key` or the backend's env var.
    ///
    /// For Ollama, `OLLAMA_MODEL` overrides the configured model.
    pub fn from_config(mut config: AiConfig, api_key: Option<String>) -> AdviceResult<Self> {
        let endpoint = config.backend.endpoint();
        let api_key = match endpoint.key_var {
            Some(var) => Some(
                api_key
                    .or_else(|| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| AdviceError::MissingApiKey {
                        env_var: var.to_string(),
                        signup_url: endpoint.key_help.to_string(),
                    })?,
            ),
            None => {
                if let Ok(model) = std::env::var("OLLAMA_MODEL") {
                    config.model = Some(model);
                }
                None
            }
        };

        let agent = ureq::config::Config::builder()
            .http_status_as_error(false) // 4xx/5xx bodies carry the provider's error text
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .new_agent();

        Ok(Self {
            config,
            api_key,
            agent,
        })
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// POST `body` and decode a successful response as `R`.
    fn post<B, R>(&self, endpoint: &Endpoint, body: &B) -> AdviceResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let mut request = self
            .agent
            .post(endpoint.url)
            .header("Content-Type", "application/json");

        if let Some(key) = &self.api_key {
            request = match endpoint.wire {
                Wire::ChatCompletions => {
                    request.header("Authorization", &format!("Bearer {key}"))
                }
                Wire::AnthropicMessages => request
                    .header("x-api-key", key)
                    .header("anthropic-version", "2023-06-01"),
            };
        }

        let response = request
            .send_json(body)
            .map_err(|e| AdviceError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AdviceError::ApiError { status, message });
        }

        response
            .into_body()
            .read_json()
            .map_err(|e| AdviceError::ParseError(e.to_string()))
    }
}

impl TextGenerator for AiClient {
    fn generate(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        max_tokens: u32,
    ) -> AdviceResult<String> {
        let endpoint = self.config.backend.endpoint();
        tracing::debug!(
            "Sending {} message(s) to {:?} ({})",
            messages.len(),
            self.config.backend,
            self.model()
        );

        match endpoint.wire {
            Wire::ChatCompletions => {
                let mut all = Vec::with_capacity(messages.len() + 1);
                if let Some(system) = system {
                    all.push(Message::new(Role::System, system));
                }
                all.extend(messages);

                let reply: ChatCompletion = self.post(
                    &endpoint,
                    &ChatCompletionRequest {
                        model: self.model(),
                        messages: all,
                        max_tokens,
                        temperature: self.config.temperature,
                    },
                )?;
                reply
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| AdviceError::ParseError("response had no choices".to_string()))
            }
            Wire::AnthropicMessages => {
                // System text travels in its own field here
                let messages = messages
                    .into_iter()
                    .filter(|m| m.role != Role::System)
                    .collect();

                let reply: AnthropicReply = self.post(
                    &endpoint,
                    &AnthropicRequest {
                        model: self.model(),
                        max_tokens,
                        messages,
                        system,
                        temperature: self.config.temperature,
                    },
                )?;
                reply
                    .content
                    .into_iter()
                    .find(|block| block.kind == "text")
                    .map(|block| block.text)
                    .ok_or_else(|| {
                        AdviceError::ParseError("response had no text block".to_string())
                    })
            }
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f32,
}

#[derive(Deserialize)]
struct AnthropicReply {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}
