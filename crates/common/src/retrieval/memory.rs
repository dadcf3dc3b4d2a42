//! In-memory document index with BM25 scoring
//!
//! Documents are chunked on upload and kept in process memory. Scores are
//! squashed into [0, 1) with `s / (s + 1)` so they can be read as relevance.

use super::chunker::{chunk_text, ChunkingConfig};
use super::{Passage, Retriever};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

#[derive(Debug, Clone)]
struct IndexedChunk {
    document_id: String,
    title: String,
    content: String,
    terms: Vec<String>,
}

#[derive(Debug, Clone)]
struct DocumentEntry {
    document_id: String,
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Index {
    documents: Vec<DocumentEntry>,
    chunks: Vec<IndexedChunk>,
}

/// Result of indexing one document
#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub document_id: String,
    pub title: String,
    pub chunks_created: usize,
}

/// Listing entry for an indexed document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub title: String,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Process-local retriever over uploaded documents
pub struct InMemoryRetriever {
    chunking: ChunkingConfig,
    index: RwLock<Index>,
}

/// Lower-cased alphanumeric terms longer than two characters
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Stable document id: first 12 hex chars of the content hash
pub(crate) fn document_id_for(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..12].to_string()
}

impl InMemoryRetriever {
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self {
            chunking,
            index: RwLock::new(Index::default()),
        }
    }

    fn poisoned() -> AppError {
        AppError::Internal {
            message: "document index lock poisoned".to_string(),
        }
    }

    /// Chunk and index a document. Re-uploading identical content replaces it.
    pub fn add_document(&self, title: &str, content: &str) -> Result<UploadedDocument> {
        let document_id = document_id_for(content);
        let chunks = chunk_text(content, &self.chunking);

        let mut index = self.index.write().map_err(|_| Self::poisoned())?;
        index.chunks.retain(|c| c.document_id != document_id);
        index.documents.retain(|d| d.document_id != document_id);

        let chunks_created = chunks.len();
        index.chunks.extend(chunks.into_iter().map(|chunk| IndexedChunk {
            document_id: document_id.clone(),
            title: title.to_string(),
            terms: tokenize(&chunk.content),
            content: chunk.content,
        }));
        index.documents.push(DocumentEntry {
            document_id: document_id.clone(),
            title: title.to_string(),
            created_at: Utc::now(),
        });

        tracing::info!(
            document_id = %document_id,
            chunks = chunks_created,
            "Document indexed"
        );

        Ok(UploadedDocument {
            document_id,
            title: title.to_string(),
            chunks_created,
        })
    }

    /// Indexed documents in upload order
    pub fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let index = self.index.read().map_err(|_| Self::poisoned())?;
        Ok(index
            .documents
            .iter()
            .map(|d| DocumentInfo {
                document_id: d.document_id.clone(),
                title: d.title.clone(),
                chunk_count: index
                    .chunks
                    .iter()
                    .filter(|c| c.document_id == d.document_id)
                    .count(),
                created_at: d.created_at,
            })
            .collect())
    }

    /// Remove a document and its chunks, returning how many chunks went
    pub fn delete_document(&self, document_id: &str) -> Result<usize> {
        let mut index = self.index.write().map_err(|_| Self::poisoned())?;
        let before = index.chunks.len();
        index.chunks.retain(|c| c.document_id != document_id);
        let removed = before - index.chunks.len();

        let had_document = index.documents.iter().any(|d| d.document_id == document_id);
        index.documents.retain(|d| d.document_id != document_id);

        if !had_document {
            return Err(AppError::DocumentNotFound {
                id: document_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Total indexed chunks
    pub fn chunk_count(&self) -> usize {
        self.index.read().map(|i| i.chunks.len()).unwrap_or(0)
    }

    fn search(&self, text: &str, k: usize) -> Result<Vec<Passage>> {
        let query_terms: HashSet<String> = tokenize(text).into_iter().collect();
        let index = self.index.read().map_err(|_| Self::poisoned())?;

        if query_terms.is_empty() || index.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let n = index.chunks.len() as f32;
        let avg_len = index.chunks.iter().map(|c| c.terms.len()).sum::<usize>() as f32 / n;

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for chunk in &index.chunks {
            let unique: HashSet<&str> = chunk.terms.iter().map(String::as_str).collect();
            for term in unique {
                if query_terms.contains(term) {
                    *doc_freq.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = index
            .chunks
            .iter()
            .filter_map(|chunk| {
                let len = chunk.terms.len() as f32;
                let score: f32 = query_terms
                    .iter()
                    .filter_map(|term| {
                        let tf = chunk.terms.iter().filter(|t| *t == term).count() as f32;
                        if tf == 0.0 {
                            return None;
                        }
                        let df = *doc_freq.get(term.as_str())? as f32;
                        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                        let norm = tf * (BM25_K1 + 1.0)
                            / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * len / avg_len.max(1.0)));
                        Some(idf * norm)
                    })
                    .sum();
                (score > 0.0).then_some((score, chunk))
            })
            .collect();

        // Stable: equal scores keep indexing order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| {
                Passage::new(chunk.content.clone())
                    .with_score(score / (score + 1.0))
                    .with_source(chunk.document_id.clone(), chunk.title.clone())
            })
            .collect())
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>> {
        self.search(text, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retriever() -> InMemoryRetriever {
        let r = InMemoryRetriever::new(ChunkingConfig::default());
        r.add_document("Auth Guide", "The authentication system issues JWT tokens after login.")
            .unwrap();
        r.add_document("Payments", "Payment flow charges the card and records an invoice.")
            .unwrap();
        r
    }

    #[tokio::test]
    async fn test_query_ranks_matching_document_first() {
        let r = retriever();
        let passages = r.query("How does authentication work with tokens?", 5).await.unwrap();

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].title.as_deref(), Some("Auth Guide"));
        let score = passages[0].score.unwrap();
        assert!(score > 0.0 && score < 1.0);
    }

    #[tokio::test]
    async fn test_no_overlap_returns_empty() {
        let r = retriever();
        assert!(r.query("quantum chromodynamics", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_equal_scores_keep_indexing_order() {
        let r = InMemoryRetriever::new(ChunkingConfig::default());
        for title in ["First", "Second", "Third", "Fourth"] {
            r.add_document(title, &format!("{} notes about caching layers", title))
                .unwrap();
        }

        for _ in 0..3 {
            let titles: Vec<String> = r
                .query("caching layers", 4)
                .await
                .unwrap()
                .into_iter()
                .filter_map(|p| p.title)
                .collect();
            assert_eq!(titles, vec!["First", "Second", "Third", "Fourth"]);
        }
    }

    #[test]
    fn test_reupload_is_idempotent() {
        let r = retriever();
        let first = r.add_document("Auth Guide", "The authentication system issues JWT tokens after login.").unwrap();
        assert_eq!(first.document_id.len(), 12);
        assert_eq!(r.list_documents().unwrap().len(), 2);
        assert_eq!(r.chunk_count(), 2);
    }

    #[test]
    fn test_delete_document() {
        let r = retriever();
        let id = document_id_for("Payment flow charges the card and records an invoice.");
        assert_eq!(r.delete_document(&id).unwrap(), 1);
        assert!(matches!(
            r.delete_document(&id),
            Err(AppError::DocumentNotFound { .. })
        ));
        assert_eq!(r.list_documents().unwrap().len(), 1);
    }
}
