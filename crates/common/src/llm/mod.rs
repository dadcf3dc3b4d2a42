//! Language model abstraction
//!
//! A language model is treated as a black box that takes named input fields
//! and a typed output contract (a [`Signature`]) and returns the output fields
//! as a [`Prediction`]. Orchestrators never see prompts or wire formats.
//!
//! Models are bound per request through a [`LanguageModelProvider`]; nothing
//! in this crate holds a process-wide model.

mod http;
mod scripted;

pub use http::{HttpLanguageModel, HttpModelProvider, ProviderKind};
pub use scripted::{RecordedCall, ScriptedModel, ScriptedProvider};

use crate::errors::Result;
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Output key carrying the model's free-text rationale, when requested
pub const RATIONALE_FIELD: &str = "rationale";

/// Declared type of an output field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Float,
    List,
}

impl FieldKind {
    /// Short type name used when describing the contract
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Float => "number between 0.0 and 1.0",
            FieldKind::List => "array of strings",
        }
    }
}

/// One named field of a signature
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Text }
    }

    pub const fn float(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::Float }
    }

    pub const fn list(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: FieldKind::List }
    }
}

/// Structured input/output contract for one model call
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    /// Stable identifier, used in logs and metrics
    pub name: &'static str,

    /// Task instructions
    pub instructions: &'static str,

    pub inputs: &'static [FieldSpec],

    pub outputs: &'static [FieldSpec],

    /// Ask the model for an additional [`RATIONALE_FIELD`]
    pub with_rationale: bool,
}

impl Signature {
    /// Names of the output fields, in declaration order
    pub fn output_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outputs.iter().map(|f| f.name)
    }
}

/// Named input values for one call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inputs {
    fields: Vec<(&'static str, String)>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(n, v)| (*n, v.as_str()))
    }
}

/// Output fields returned by a model
///
/// Accessors are tolerant: the orchestration core decides how to default
/// malformed values, so nothing here fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    fields: Map<String, Value>,
}

impl Prediction {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from a JSON object; any other value yields an empty prediction
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Raw value of a field
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field rendered as text. Missing or null fields become an empty string.
    pub fn text(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Field as a list of strings. Anything that is not an array becomes empty.
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The rationale, if the model produced a non-empty one
    pub fn rationale(&self) -> Option<String> {
        let text = self.text(RATIONALE_FIELD);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// A callable language model bound to one model identifier
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one structured call
    async fn invoke(&self, signature: &Signature, inputs: &Inputs) -> Result<Prediction>;

    /// Identifier this model was bound with, e.g. `openai/gpt-4o-mini`
    fn model_id(&self) -> &str;
}

/// Per-request model selection
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            system_prompt: None,
        }
    }
}

/// Creates request-scoped model bindings
pub trait LanguageModelProvider: Send + Sync {
    /// Bind a model for the duration of one orchestration call
    fn bind(&self, request: &ModelRequest) -> Result<Arc<dyn LanguageModel>>;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;
}

/// Invoke a model with logging and metrics.
///
/// Every orchestrator goes through here so that call counts are observable.
pub async fn predict(
    model: &dyn LanguageModel,
    signature: &Signature,
    inputs: &Inputs,
) -> Result<Prediction> {
    tracing::debug!(
        model = model.model_id(),
        signature = signature.name,
        "Invoking language model"
    );

    let result = model.invoke(signature, inputs).await;
    metrics::record_llm_call(model.model_id(), signature.name, result.is_ok());

    if let Err(e) = &result {
        tracing::warn!(
            model = model.model_id(),
            signature = signature.name,
            error = %e,
            "Language model call failed"
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prediction_text_is_tolerant() {
        let p = Prediction::from_value(json!({
            "answer": "Paris",
            "confidence": 0.9,
            "missing_null": null,
        }));
        assert_eq!(p.text("answer"), "Paris");
        assert_eq!(p.text("confidence"), "0.9");
        assert_eq!(p.text("missing_null"), "");
        assert_eq!(p.text("absent"), "");
    }

    #[test]
    fn test_prediction_list_coercion() {
        let p = Prediction::from_value(json!({
            "citations": ["Source 1", 2],
            "risks": "not a list",
        }));
        assert_eq!(p.list("citations"), vec!["Source 1".to_string(), "2".to_string()]);
        assert!(p.list("risks").is_empty());
        assert!(p.list("absent").is_empty());
    }

    #[test]
    fn test_rationale_ignores_blank() {
        let p = Prediction::from_value(json!({ "rationale": "  " }));
        assert!(p.rationale().is_none());
        let p = Prediction::from_value(json!({ "rationale": "because" }));
        assert_eq!(p.rationale().as_deref(), Some("because"));
    }

    #[test]
    fn test_inputs_lookup() {
        let inputs = Inputs::new().with("question", "why?").with("context", "");
        assert_eq!(inputs.get("question"), Some("why?"));
        assert_eq!(inputs.get("context"), Some(""));
        assert_eq!(inputs.get("other"), None);
    }
}
