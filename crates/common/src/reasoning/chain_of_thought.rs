//! Chain-of-thought and direct answering

use crate::confidence;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use serde::{Deserialize, Serialize};

/// Reasoning text reported for direct answers
pub const DIRECT_REASONING: &str = "Direct answer without explicit reasoning";

/// Fixed confidence for direct answers
pub const DIRECT_CONFIDENCE: f32 = 0.7;

pub const STEP_BY_STEP: Signature = Signature {
    name: "chain_of_thought",
    instructions: "Reason step by step about the question, then give the final answer.",
    inputs: &[FieldSpec::text("question", "The question or problem to reason about")],
    outputs: &[
        FieldSpec::text("reasoning", "Step-by-step reasoning process"),
        FieldSpec::text("answer", "The final answer"),
        FieldSpec::float("confidence", "Confidence in the answer from 0.0 to 1.0"),
    ],
    with_rationale: true,
};

pub const DIRECT_ANSWER: Signature = Signature {
    name: "direct_answer",
    instructions: "Answer the question.",
    inputs: &[FieldSpec::text("question", "The question")],
    outputs: &[FieldSpec::text("answer", "The answer")],
    with_rationale: false,
};

/// Reasoned answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonedAnswer {
    pub answer: String,
    pub reasoning: String,

    /// Always in [0, 1]
    pub confidence: f32,
}

/// Step-by-step reasoning before answering
#[derive(Debug, Clone, Default)]
pub struct ChainOfThought;

impl ChainOfThought {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self, model: &dyn LanguageModel, question: &str) -> Result<ReasonedAnswer> {
        let inputs = Inputs::new().with("question", question);
        let prediction = predict(model, &STEP_BY_STEP, &inputs).await?;

        Ok(ReasonedAnswer {
            answer: prediction.text("answer"),
            reasoning: prediction.text("reasoning"),
            confidence: confidence::normalize(prediction.raw("confidence")),
        })
    }
}

/// Direct answer, no reasoning requested
#[derive(Debug, Clone, Default)]
pub struct BasicAnswer;

impl BasicAnswer {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self, model: &dyn LanguageModel, question: &str) -> Result<ReasonedAnswer> {
        let inputs = Inputs::new().with("question", question);
        let prediction = predict(model, &DIRECT_ANSWER, &inputs).await?;

        Ok(ReasonedAnswer {
            answer: prediction.text("answer"),
            reasoning: DIRECT_REASONING.to_string(),
            confidence: DIRECT_CONFIDENCE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_chain_of_thought_normalizes_confidence() {
        let model = ScriptedModel::new(vec![
            json!({ "reasoning": "5 machines, 5 minutes", "answer": "5 minutes", "confidence": "0.95" }),
            json!({ "reasoning": "r", "answer": "a", "confidence": "very high" }),
        ]);
        let cot = ChainOfThought::new();

        let first = cot.run(&model, "widgets?").await.unwrap();
        assert_eq!(first.answer, "5 minutes");
        assert_eq!(first.confidence, 0.95);

        let second = cot.run(&model, "again").await.unwrap();
        assert_eq!(second.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_basic_answer_is_fixed_confidence() {
        let model = ScriptedModel::new(vec![json!({ "answer": "Paris" })]);
        let out = BasicAnswer::new().run(&model, "Capital of France?").await.unwrap();
        assert_eq!(out.answer, "Paris");
        assert_eq!(out.reasoning, DIRECT_REASONING);
        assert_eq!(out.confidence, 0.7);
        assert_eq!(model.calls()[0].signature, "direct_answer");
    }
}
