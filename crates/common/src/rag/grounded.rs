//! Source-attributed RAG with retrieval-derived confidence
//!
//! Unlike [`super::CitedRag`], confidence here is not asked of the model: it
//! is the mean relevance of the retrieved sources.

use super::ANSWER_FROM_CONTEXT;
use crate::confidence;
use crate::errors::Result;
use crate::llm::{predict, Inputs, LanguageModel};
use crate::retrieval::{join_with_source_markers, retrieve, Passage, Retriever};
use serde::{Deserialize, Serialize};

/// Context given to the model when nothing was retrieved
pub const NO_DOCUMENTS_CONTEXT: &str = "No relevant documents found.";

/// Confidence when there are no sources
pub const NO_SOURCES_CONFIDENCE: f32 = 0.3;

/// Relevance assumed for passages the retriever did not score
pub const UNSCORED_RELEVANCE: f32 = 0.5;

const EXCERPT_CHARS: usize = 200;

/// A source backing an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub document_id: String,
    pub title: String,
    pub excerpt: String,

    /// Always in [0, 1]
    pub relevance_score: f32,
}

impl Source {
    /// Describe the `index`-th retrieved passage
    pub fn from_passage(index: usize, passage: &Passage) -> Self {
        Self {
            document_id: passage
                .document_id
                .clone()
                .unwrap_or_else(|| format!("doc_{}", index)),
            title: passage.title.clone().unwrap_or_else(|| "Unknown".to_string()),
            excerpt: excerpt(&passage.text),
            relevance_score: passage
                .score
                .map(confidence::clamp)
                .unwrap_or(UNSCORED_RELEVANCE),
        }
    }
}

/// First 200 characters, with `...` appended when cut
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Mean relevance of the sources, or [`NO_SOURCES_CONFIDENCE`]
pub fn aggregate_confidence(sources: &[Source]) -> f32 {
    if sources.is_empty() {
        return NO_SOURCES_CONFIDENCE;
    }
    let total: f32 = sources.iter().map(|s| s.relevance_score).sum();
    confidence::clamp(total / sources.len() as f32)
}

/// Answer with the sources it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub answer: String,

    /// Empty when citations were not requested
    pub sources: Vec<Source>,

    pub confidence: f32,

    pub passages_used: usize,
}

#[derive(Debug, Clone)]
pub struct GroundedRagConfig {
    pub num_passages: usize,

    /// Attach sources to the answer
    pub include_citations: bool,
}

impl Default for GroundedRagConfig {
    fn default() -> Self {
        Self {
            num_passages: 5,
            include_citations: true,
        }
    }
}

/// Host-facing RAG path
pub struct GroundedRag {
    config: GroundedRagConfig,
}

impl GroundedRag {
    pub fn new(config: GroundedRagConfig) -> Self {
        Self { config }
    }

    pub async fn answer(
        &self,
        model: &dyn LanguageModel,
        retriever: &dyn Retriever,
        question: &str,
    ) -> Result<GroundedAnswer> {
        let passages = retrieve(retriever, question, self.config.num_passages).await?;

        let sources: Vec<Source> = passages
            .iter()
            .enumerate()
            .map(|(i, p)| Source::from_passage(i, p))
            .collect();

        let context = if passages.is_empty() {
            NO_DOCUMENTS_CONTEXT.to_string()
        } else {
            join_with_source_markers(passages.iter().map(|p| p.text.as_str()))
        };

        let inputs = Inputs::new()
            .with("context", context.as_str())
            .with("question", question);
        let prediction = predict(model, &ANSWER_FROM_CONTEXT, &inputs).await?;

        let confidence = aggregate_confidence(&sources);
        tracing::info!(
            passages = passages.len(),
            confidence = confidence,
            "Grounded answer generated"
        );

        Ok(GroundedAnswer {
            answer: prediction.text("answer"),
            sources: if self.config.include_citations { sources } else { Vec::new() },
            confidence,
            passages_used: passages.len(),
        })
    }
}
