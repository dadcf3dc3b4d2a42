//! Scripted language model for tests and local development
//!
//! Replies come from a queue or from a responder function; every call is
//! recorded so tests can assert on what the orchestrators asked for.

use super::{Inputs, LanguageModel, LanguageModelProvider, ModelRequest, Prediction, Signature};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&Signature, &Inputs) -> Result<Prediction> + Send + Sync;

/// One recorded model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub signature: &'static str,
    pub inputs: Inputs,
}

enum Script {
    Queue(Mutex<VecDeque<Value>>),
    Responder(Box<Responder>),
}

/// Mock model replaying canned predictions
pub struct ScriptedModel {
    model_id: String,
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    /// Reply with these JSON objects in order; fails once they run out
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            model_id: "scripted/mock".to_string(),
            script: Script::Queue(Mutex::new(replies.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Compute each reply from the signature and inputs
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&Signature, &Inputs) -> Result<Prediction> + Send + Sync + 'static,
    {
        Self {
            model_id: "scripted/mock".to_string(),
            script: Script::Responder(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, signature: &Signature, inputs: &Inputs) -> Result<Prediction> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                signature: signature.name,
                inputs: inputs.clone(),
            });
        }

        match &self.script {
            Script::Responder(responder) => responder(signature, inputs),
            Script::Queue(queue) => {
                let next = queue.lock().ok().and_then(|mut q| q.pop_front());
                next.map(Prediction::from_value).ok_or_else(|| {
                    AppError::language_model(
                        &self.model_id,
                        format!("script exhausted at {}", signature.name),
                    )
                })
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Provider handing out one shared scripted model, remembering bind requests
pub struct ScriptedProvider {
    model: Arc<ScriptedModel>,
    default_model: String,
    bound: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(model: Arc<ScriptedModel>) -> Self {
        Self {
            model,
            default_model: "scripted/default".to_string(),
            bound: Mutex::new(Vec::new()),
        }
    }

    pub fn model(&self) -> &Arc<ScriptedModel> {
        &self.model
    }

    /// Requests passed to `bind`, in order
    pub fn bound(&self) -> Vec<ModelRequest> {
        self.bound.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl LanguageModelProvider for ScriptedProvider {
    fn bind(&self, request: &ModelRequest) -> Result<Arc<dyn LanguageModel>> {
        if let Ok(mut bound) = self.bound.lock() {
            bound.push(request.clone());
        }
        Ok(self.model.clone())
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
