//! Canned retriever for tests and demos

use super::{Passage, Retriever};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Returns pre-set passage lists, one per query, and records the queries.
///
/// Once the queue is drained it keeps answering with an empty list, unless
/// built with [`FixedRetriever::failing`].
pub struct FixedRetriever {
    results: Mutex<VecDeque<Vec<Passage>>>,
    repeat_last: Option<Vec<Passage>>,
    fail: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FixedRetriever {
    /// Answer successive queries with these lists in order
    pub fn new(results: Vec<Vec<Passage>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            repeat_last: None,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Answer every query with the same passages, truncated to `k`
    pub fn always(passages: Vec<Passage>) -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            repeat_last: Some(passages),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query fails
    pub fn failing() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            repeat_last: None,
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: bare passages from strings
    pub fn texts<I, S>(texts: I) -> Vec<Passage>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts.into_iter().map(Passage::new).collect()
    }

    /// `(query, k)` pairs seen so far
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((text.to_string(), k));
        }

        if self.fail {
            return Err(AppError::Retrieval {
                message: "retriever unavailable".to_string(),
            });
        }

        let next = self.results.lock().ok().and_then(|mut r| r.pop_front());
        let mut passages = next
            .or_else(|| self.repeat_last.clone())
            .unwrap_or_default();
        passages.truncate(k);
        Ok(passages)
    }
}
