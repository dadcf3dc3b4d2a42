//! Configuration management for ReasonForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Provider credentials from OPENAI_API_KEY / ANTHROPIC_API_KEY
//! - Default values

use crate::llm::ProviderKind;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model providers
    #[serde(default)]
    pub llm: LlmConfig,

    /// Orchestration defaults and ceilings
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Document indexing for the in-memory retriever
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Model used when a request does not name one, e.g. `openai/gpt-4o-mini`
    #[serde(default = "default_model")]
    pub default_model: String,

    /// OpenAI credential
    pub openai_api_key: Option<String>,

    /// Anthropic credential
    pub anthropic_api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_openai_base")]
    pub openai_base_url: String,

    /// Anthropic base URL
    #[serde(default = "default_anthropic_base")]
    pub anthropic_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum elapsed time spent retrying one call, in seconds
    #[serde(default = "default_llm_retry_budget")]
    pub retry_budget_secs: u64,

    /// Maximum output tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature when the request does not set one
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestrationConfig {
    /// ReAct iteration ceiling when the request does not set one
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Tree-of-thought branches when the request does not set one
    #[serde(default = "default_num_branches")]
    pub num_branches: usize,

    /// Run tree-of-thought branches concurrently with this many workers.
    /// Unset keeps exploration sequential.
    pub branch_workers: Option<usize>,

    /// Passages for the cited/grounded RAG paths
    #[serde(default = "default_rag_passages")]
    pub rag_num_passages: usize,

    /// Passages per hop for multi-hop RAG
    #[serde(default = "default_multi_hop_passages")]
    pub multi_hop_num_passages: usize,

    /// Retrieval rounds for multi-hop RAG
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Cap on joined context handed to the model (characters)
    pub max_context_chars: Option<usize>,

    /// Threshold for decision `meets_threshold`
    #[serde(default = "default_decision_confidence")]
    pub decision_min_confidence: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 120 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_model() -> String { "anthropic/claude-sonnet-4-20250514".to_string() }
fn default_openai_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_anthropic_base() -> String { "https://api.anthropic.com/v1".to_string() }
fn default_llm_timeout() -> u64 { 60 }
fn default_llm_retry_budget() -> u64 { 30 }
fn default_max_tokens() -> u32 { 2048 }
fn default_temperature() -> f32 { 0.7 }
fn default_max_iterations() -> usize { 5 }
fn default_num_branches() -> usize { 3 }
fn default_rag_passages() -> usize { 5 }
fn default_multi_hop_passages() -> usize { 3 }
fn default_max_hops() -> usize { 3 }
fn default_decision_confidence() -> f32 { 0.7 }
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "reasonforge".to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 40 }
fn default_enabled() -> bool { true }

const OPENAI_MODELS: &[&str] = &[
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "openai/gpt-4.1",
    "openai/o1",
    "openai/o3-mini",
];

const ANTHROPIC_MODELS: &[&str] = &[
    "anthropic/claude-sonnet-4-20250514",
    "anthropic/claude-opus-4-20250514",
    "anthropic/claude-3-7-sonnet-20250219",
];

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__LLM__DEFAULT_MODEL=openai/gpt-4o
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.apply_provider_env();
        Ok(config)
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.apply_provider_env();
        Ok(config)
    }

    /// Fill missing credentials from the conventional provider variables
    fn apply_provider_env(&mut self) {
        if self.llm.openai_api_key.is_none() {
            self.llm.openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if self.llm.anthropic_api_key.is_none() {
            self.llm.anthropic_api_key =
                std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if let Ok(model) = std::env::var("DEFAULT_MODEL") {
            if !model.is_empty() {
                self.llm.default_model = model;
            }
        }
    }

    /// Models that can be served with the configured credentials
    pub fn available_models(&self) -> Vec<String> {
        let mut models = Vec::new();
        if self.llm.openai_api_key.is_some() {
            models.extend(OPENAI_MODELS.iter().map(|m| m.to_string()));
        }
        if self.llm.anthropic_api_key.is_some() {
            models.extend(ANTHROPIC_MODELS.iter().map(|m| m.to_string()));
        }
        models
    }

    /// Check credentials against the default model. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.llm.openai_api_key.is_none() && self.llm.anthropic_api_key.is_none() {
            errors.push(
                "At least one API key (OPENAI_API_KEY or ANTHROPIC_API_KEY) is required".to_string(),
            );
        }
        let missing_key = match ProviderKind::for_model(&self.llm.default_model) {
            ProviderKind::Anthropic if self.llm.anthropic_api_key.is_none() => {
                Some("ANTHROPIC_API_KEY")
            }
            ProviderKind::OpenAi if self.llm.openai_api_key.is_none() => Some("OPENAI_API_KEY"),
            _ => None,
        };
        if let Some(key) = missing_key {
            errors.push(format!(
                "Default model {} requires {}",
                self.llm.default_model, key
            ));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            errors.push("retrieval.chunk_overlap must be smaller than retrieval.chunk_size".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: default_openai_base(),
            anthropic_base_url: default_anthropic_base(),
            timeout_secs: default_llm_timeout(),
            retry_budget_secs: default_llm_retry_budget(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            num_branches: default_num_branches(),
            branch_workers: None,
            rag_num_passages: default_rag_passages(),
            multi_hop_num_passages: default_multi_hop_passages(),
            max_hops: default_max_hops(),
            max_context_chars: None,
            decision_min_confidence: default_decision_confidence(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.orchestration.max_iterations, 5);
        assert_eq!(config.orchestration.num_branches, 3);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert!(config.orchestration.branch_workers.is_none());
    }

    #[test]
    fn test_validate_requires_a_key() {
        let config = AppConfig::default();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("At least one API key")));
        assert!(errors.iter().any(|e| e.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn test_validate_matches_dispatch() {
        let mut config = AppConfig::default();
        config.llm.anthropic_api_key = Some("sk-ant-test".into());
        config.llm.default_model = "openai/anthropic-proxy".into();

        let errors = config.validate().unwrap_err();
        assert_eq!(
            errors,
            vec!["Default model openai/anthropic-proxy requires OPENAI_API_KEY".to_string()]
        );
    }

    #[test]
    fn test_available_models_follow_keys() {
        let mut config = AppConfig::default();
        assert!(config.available_models().is_empty());

        config.llm.openai_api_key = Some("sk-test".into());
        config.llm.default_model = "openai/gpt-4o-mini".into();
        let models = config.available_models();
        assert!(models.contains(&"openai/gpt-4o-mini".to_string()));
        assert!(!models.iter().any(|m| m.starts_with("anthropic/")));
        assert!(config.validate().is_ok());
    }
}
