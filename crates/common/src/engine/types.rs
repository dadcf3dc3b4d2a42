//! Engine request and response types

use crate::agents::{GeneratedCode, TrajectoryStep};
use crate::rag::Source;
use crate::reasoning::{Analysis, Branch, Decision};
use crate::retrieval::Passage;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============== Chat ==============

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 32000))]
    pub message: String,

    /// Model override, e.g. `openai/gpt-4o-mini`
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[validate(range(min = 0.0, max = 2.0))]
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub confidence: f32,
}

// ============== RAG ==============

/// How a RAG query is answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RagMode {
    /// Plain answer from joined passages
    Simple,
    /// Model-reported citations and confidence
    Cited,
    /// Source records with retrieval-derived confidence
    #[default]
    Grounded,
}

impl RagMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RagMode::Simple => "simple",
            RagMode::Cited => "cited",
            RagMode::Grounded => "grounded",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RagQuery {
    #[validate(length(min = 1, max = 4000))]
    pub question: String,

    #[serde(default)]
    pub mode: RagMode,

    #[validate(range(min = 1, max = 20))]
    #[serde(default)]
    pub num_passages: Option<usize>,

    #[serde(default = "default_true")]
    pub include_citations: bool,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<Source>,

    /// Citations reported by the model, cited mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,

    pub confidence: f32,
    pub mode: RagMode,
    pub model: String,
    pub passages_used: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MultiHopQuery {
    #[validate(length(min = 1, max = 4000))]
    pub question: String,

    /// Passages per hop
    #[validate(range(min = 1, max = 20))]
    #[serde(default)]
    pub num_passages: Option<usize>,

    #[validate(range(min = 1, max = 5))]
    #[serde(default)]
    pub max_hops: Option<usize>,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiHopResponse {
    pub answer: String,
    pub reasoning: String,
    pub passages: Vec<Passage>,
    pub hops_used: usize,
    pub model: String,
}

// ============== Agent ==============

/// A tool the caller wants the agent to know about
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ToolDefinition {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AgentTask {
    #[validate(length(min = 1, max = 8000))]
    pub task: String,

    #[validate(nested)]
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    #[validate(range(min = 1, max = 20))]
    #[serde(default)]
    pub max_iterations: Option<usize>,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub answer: String,
    pub success: bool,
    pub steps: Vec<TrajectoryStep>,
    pub iterations_used: usize,
    pub model: String,
}

// ============== Reasoning ==============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningPattern {
    Basic,
    #[default]
    ChainOfThought,
    TreeOfThought,
    React,
}

impl ReasoningPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningPattern::Basic => "basic",
            ReasoningPattern::ChainOfThought => "chain_of_thought",
            ReasoningPattern::TreeOfThought => "tree_of_thought",
            ReasoningPattern::React => "react",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReasoningQuery {
    #[validate(length(min = 1, max = 8000))]
    pub question: String,

    #[serde(default)]
    pub pattern: ReasoningPattern,

    #[serde(default)]
    pub model: Option<String>,

    /// Tree-of-thought branches
    #[validate(range(min = 2, max = 5))]
    #[serde(default)]
    pub num_branches: Option<usize>,

    /// ReAct iterations
    #[validate(range(min = 1, max = 20))]
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasoningResponse {
    pub answer: String,
    pub reasoning: String,
    pub confidence: f32,
    pub pattern_used: ReasoningPattern,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DecisionQuery {
    #[validate(length(min = 1, max = 8000))]
    pub situation: String,

    #[validate(length(min = 1, max = 8000))]
    pub options: String,

    #[serde(default)]
    pub constraints: String,

    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub min_confidence: Option<f32>,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    #[serde(flatten)]
    pub decision: Decision,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnalysisQuery {
    #[validate(length(min = 1, max = 8000))]
    pub topic: String,

    #[serde(default)]
    pub context: String,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: Analysis,
    pub model: String,
}

// ============== Code ==============

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CodeTask {
    #[validate(length(min = 1, max = 8000))]
    pub task: String,

    #[validate(length(max = 32))]
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeResponse {
    #[serde(flatten)]
    pub code: GeneratedCode,
    pub model: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    crate::agents::DEFAULT_LANGUAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasoning_query_defaults() {
        let query: ReasoningQuery = serde_json::from_value(json!({ "question": "why?" })).unwrap();
        assert_eq!(query.pattern, ReasoningPattern::ChainOfThought);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_branch_range_validated() {
        let query: ReasoningQuery = serde_json::from_value(json!({
            "question": "why?",
            "pattern": "tree_of_thought",
            "num_branches": 9,
        }))
        .unwrap();
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_agent_task_validation() {
        let task: AgentTask = serde_json::from_value(json!({
            "task": "Calculate 25 * 4 + 100",
            "tools": [{ "name": "", "description": "nameless" }],
        }))
        .unwrap();
        assert!(task.validate().is_err());

        let task: AgentTask = serde_json::from_value(json!({
            "task": "x",
            "max_iterations": 21,
        }))
        .unwrap();
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_code_task_defaults_to_python() {
        let task: CodeTask = serde_json::from_value(json!({ "task": "fizzbuzz" })).unwrap();
        assert_eq!(task.language, "python");
    }

    #[test]
    fn test_rag_query_defaults() {
        let query: RagQuery = serde_json::from_value(json!({ "question": "q" })).unwrap();
        assert!(query.include_citations);
        assert!(query.num_passages.is_none());
        assert_eq!(query.mode, RagMode::Grounded);

        let query: RagQuery =
            serde_json::from_value(json!({ "question": "q", "mode": "cited" })).unwrap();
        assert_eq!(query.mode, RagMode::Cited);
    }
}
