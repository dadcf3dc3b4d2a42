//! HTTP-backed language models
//!
//! Supports OpenAI-compatible chat completions and the Anthropic messages API.
//! The structured contract is satisfied by asking for a single JSON object
//! whose keys are the signature's output fields.

use super::{
    FieldKind, Inputs, LanguageModel, LanguageModelProvider, ModelRequest, Prediction, Signature,
    RATIONALE_FIELD,
};
use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Which wire API a model identifier maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// `anthropic/...` identifiers use the Anthropic API, everything else is
    /// treated as OpenAI-compatible.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("anthropic/") {
            ProviderKind::Anthropic
        } else {
            ProviderKind::OpenAi
        }
    }
}

/// Language model reached over HTTP
pub struct HttpLanguageModel {
    client: reqwest::Client,
    provider: ProviderKind,
    model_id: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: Option<String>,
    retry_budget: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl HttpLanguageModel {
    /// Model name as the provider expects it (`openai/gpt-4o` -> `gpt-4o`)
    fn wire_model(&self) -> &str {
        self.model_id
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(self.model_id.as_str())
    }

    fn system_message(&self, signature: &Signature) -> String {
        match &self.system_prompt {
            Some(extra) => format!("{}\n\n{}", extra, signature.instructions),
            None => signature.instructions.to_string(),
        }
    }

    async fn send(&self, system: &str, user: &str) -> std::result::Result<String, backoff::Error<AppError>> {
        let request = match self.provider {
            ProviderKind::OpenAi => self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": self.wire_model(),
                    "messages": [
                        ChatMessage { role: "system", content: system },
                        ChatMessage { role: "user", content: user },
                    ],
                    "max_tokens": self.max_tokens,
                    "temperature": self.temperature,
                    "response_format": { "type": "json_object" },
                })),
            ProviderKind::Anthropic => self
                .client
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.wire_model(),
                    "system": system,
                    "messages": [ ChatMessage { role: "user", content: user } ],
                    "max_tokens": self.max_tokens,
                    "temperature": self.temperature,
                })),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                backoff::Error::transient(AppError::HttpClient(e))
            } else {
                backoff::Error::permanent(AppError::HttpClient(e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = AppError::language_model(
                &self.model_id,
                format!("API error {}: {}", status, body),
            );
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        let text = match self.provider {
            ProviderKind::OpenAi => {
                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| backoff::Error::permanent(AppError::HttpClient(e)))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
            ProviderKind::Anthropic => {
                let parsed: MessagesResponse = response
                    .json()
                    .await
                    .map_err(|e| backoff::Error::permanent(AppError::HttpClient(e)))?;
                let joined: String = parsed.content.into_iter().filter_map(|b| b.text).collect();
                Some(joined)
            }
        };

        text.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            backoff::Error::permanent(AppError::language_model(
                &self.model_id,
                "Empty response from language model",
            ))
        })
    }
}

/// Render the user message: inputs first, then the output contract
pub(crate) fn render_prompt(signature: &Signature, inputs: &Inputs) -> String {
    let mut prompt = String::new();

    for field in signature.inputs {
        let value = inputs.get(field.name).unwrap_or("");
        prompt.push_str(&format!("{} ({}):\n{}\n\n", field.name, field.description, value));
    }

    prompt.push_str("Respond with a single JSON object with exactly these keys:\n");
    if signature.with_rationale {
        prompt.push_str(&format!(
            "- \"{}\" (string): think step by step before producing the other fields\n",
            RATIONALE_FIELD
        ));
    }
    for field in signature.outputs {
        prompt.push_str(&format!(
            "- \"{}\" ({}): {}\n",
            field.name,
            field.kind.type_name(),
            field.description
        ));
    }
    prompt
}

/// Pull the JSON object out of a model reply and check the contract
pub(crate) fn parse_reply(model_id: &str, signature: &Signature, reply: &str) -> Result<Prediction> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if e > s => &reply[s..=e],
        _ => {
            return Err(AppError::language_model(
                model_id,
                format!("{}: reply is not a JSON object", signature.name),
            ))
        }
    };

    let value: Value = serde_json::from_str(body).map_err(|e| {
        AppError::language_model(model_id, format!("{}: invalid JSON reply: {}", signature.name, e))
    })?;

    let prediction = Prediction::from_value(value);
    for field in signature.outputs {
        // Numeric and list fields are coerced downstream; only text is required
        if field.kind == FieldKind::Text && !prediction.contains(field.name) {
            return Err(AppError::language_model(
                model_id,
                format!("{}: missing output field '{}'", signature.name, field.name),
            ));
        }
    }
    Ok(prediction)
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn invoke(&self, signature: &Signature, inputs: &Inputs) -> Result<Prediction> {
        let system = self.system_message(signature);
        let user = render_prompt(signature, inputs);

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(self.retry_budget))
            .build();

        let this = self;
        let (system, user) = (system.as_str(), user.as_str());
        let reply = backoff::future::retry_notify(
            policy,
            move || async move { this.send(system, user).await },
            |e: AppError, wait: Duration| {
                tracing::warn!(
                    model = %this.model_id,
                    error = %e,
                    retry_in_ms = wait.as_millis() as u64,
                    "Language model request failed, retrying"
                );
            },
        )
        .await?;

        parse_reply(&self.model_id, signature, &reply)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Binds HTTP models from configuration and per-request overrides
pub struct HttpModelProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpModelProvider {
    /// Create a provider with a shared HTTP client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }
}

impl LanguageModelProvider for HttpModelProvider {
    fn bind(&self, request: &ModelRequest) -> Result<Arc<dyn LanguageModel>> {
        let provider = ProviderKind::for_model(&request.model);
        let (api_key, base_url, env_name) = match provider {
            ProviderKind::Anthropic => (
                self.config.anthropic_api_key.clone(),
                self.config.anthropic_base_url.clone(),
                "ANTHROPIC_API_KEY",
            ),
            ProviderKind::OpenAi => (
                self.config.openai_api_key.clone(),
                self.config.openai_base_url.clone(),
                "OPENAI_API_KEY",
            ),
        };

        let api_key = api_key.ok_or_else(|| AppError::Configuration {
            message: format!("Model {} requires {}", request.model, env_name),
        })?;

        Ok(Arc::new(HttpLanguageModel {
            client: self.client.clone(),
            provider,
            model_id: request.model.clone(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: self.config.max_tokens,
            system_prompt: request.system_prompt.clone(),
            retry_budget: Duration::from_secs(self.config.retry_budget_secs),
        }))
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
