//! Passage retrieval
//!
//! The orchestration core only depends on the [`Retriever`] trait:
//! `query(text, k)` returns passages most-relevant first. Two implementations
//! ship here:
//! - [`InMemoryRetriever`]: chunked documents scored with BM25
//! - [`FixedRetriever`]: canned results for tests

mod chunker;
mod fixed;
mod memory;

pub use chunker::{chunk_text, ChunkingConfig, TextChunk};
pub use fixed::FixedRetriever;
pub use memory::{DocumentInfo, InMemoryRetriever, UploadedDocument};

use crate::errors::Result;
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A retrieved unit of text with optional relevance and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub text: String,

    /// Relevance reported by the retriever, higher is better
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Source document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    /// Source document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Passage {
    /// A bare passage with no score or provenance
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
            document_id: None,
            title: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_source(mut self, document_id: impl Into<String>, title: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self.title = Some(title.into());
        self
    }
}

/// External passage retriever
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` passages for `text`, most relevant first
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>>;
}

/// Query a retriever with logging and metrics
pub async fn retrieve(retriever: &dyn Retriever, text: &str, k: usize) -> Result<Vec<Passage>> {
    let passages = retriever.query(text, k).await?;

    tracing::debug!(
        query_len = text.len(),
        k = k,
        returned = passages.len(),
        "Retrieved passages"
    );
    metrics::record_retrieval(passages.len());

    Ok(passages)
}

/// Join passage texts with blank lines, the context format the models see
pub fn join_passages<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts.into_iter().collect::<Vec<_>>().join("\n\n")
}

/// Prefix each passage with a 1-based `[Source i]` marker and join
pub fn join_with_source_markers<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| format!("[Source {}]: {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
