//! RAG with positional source citations and model-estimated confidence

use crate::confidence;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use crate::retrieval::{join_with_source_markers, retrieve, Passage, Retriever};
use serde::{Deserialize, Serialize};

/// Answer returned when nothing was retrieved
pub const INSUFFICIENT_INFORMATION: &str =
    "I don't have enough information to answer this question.";

pub const CITED_ANSWER: Signature = Signature {
    name: "cited_answer",
    instructions: "Answer questions with source citations.",
    inputs: &[
        FieldSpec::text("context", "Retrieved passages with source information"),
        FieldSpec::text("question", "The user's question"),
    ],
    outputs: &[
        FieldSpec::text("answer", "A detailed answer based on the context"),
        FieldSpec::list("citations", "List of sources used in the answer"),
        FieldSpec::float("confidence", "Confidence score from 0.0 to 1.0"),
    ],
    with_rationale: true,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitedAnswer {
    pub answer: String,
    pub citations: Vec<String>,

    /// Always in [0, 1]; 0.0 when nothing was retrieved
    pub confidence: f32,

    /// Marked-up context the model was given
    pub context: String,

    pub passages: Vec<Passage>,
}

/// RAG whose model reports citations and its own confidence
#[derive(Debug, Clone)]
pub struct CitedRag {
    num_passages: usize,
}

impl Default for CitedRag {
    fn default() -> Self {
        Self { num_passages: 5 }
    }
}

impl CitedRag {
    pub fn new(num_passages: usize) -> Self {
        Self { num_passages }
    }

    pub async fn answer(
        &self,
        model: &dyn LanguageModel,
        retriever: &dyn Retriever,
        question: &str,
    ) -> Result<CitedAnswer> {
        let passages = retrieve(retriever, question, self.num_passages).await?;

        if passages.is_empty() {
            tracing::info!("No passages retrieved, skipping generation");
            return Ok(CitedAnswer {
                answer: INSUFFICIENT_INFORMATION.to_string(),
                citations: Vec::new(),
                confidence: 0.0,
                context: String::new(),
                passages,
            });
        }

        let context = join_with_source_markers(passages.iter().map(|p| p.text.as_str()));
        let inputs = Inputs::new()
            .with("context", context.as_str())
            .with("question", question);
        let prediction = predict(model, &CITED_ANSWER, &inputs).await?;

        Ok(CitedAnswer {
            answer: prediction.text("answer"),
            citations: prediction.list("citations"),
            confidence: confidence::normalize(prediction.raw("confidence")),
            context,
            passages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::retrieval::FixedRetriever;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_retrieval_short_circuits() {
        let retriever = FixedRetriever::new(vec![]);
        let model = ScriptedModel::new(vec![]);

        let out = CitedRag::default().answer(&model, &retriever, "anything").await.unwrap();
        assert_eq!(out.answer, INSUFFICIENT_INFORMATION);
        assert!(out.citations.is_empty());
        assert_eq!(out.confidence, 0.0);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_markers_and_normalization() {
        let retriever = FixedRetriever::always(FixedRetriever::texts(["JWT tokens", "Refresh flow"]));
        let model = ScriptedModel::new(vec![json!({
            "answer": "Uses JWT",
            "citations": "Source 1",
            "confidence": 1.4,
        })]);

        let out = CitedRag::default().answer(&model, &retriever, "How does auth work?").await.unwrap();
        assert_eq!(out.context, "[Source 1]: JWT tokens\n\n[Source 2]: Refresh flow");
        assert!(out.citations.is_empty());
        assert_eq!(out.confidence, 1.0);
        assert_eq!(
            model.calls()[0].inputs.get("context"),
            Some("[Source 1]: JWT tokens\n\n[Source 2]: Refresh flow")
        );
    }

    #[tokio::test]
    async fn test_citations_list_kept() {
        let retriever = FixedRetriever::always(FixedRetriever::texts(["a"]));
        let model = ScriptedModel::new(vec![json!({
            "answer": "x",
            "citations": ["Source 1", 2],
            "confidence": "0.8",
        })]);

        let out = CitedRag::new(1).answer(&model, &retriever, "q").await.unwrap();
        assert_eq!(out.citations, vec!["Source 1".to_string(), "2".to_string()]);
        assert_eq!(out.confidence, 0.8);
    }
}
