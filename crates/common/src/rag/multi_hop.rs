//! Multi-hop retriever - Iterative query expansion
//!
//! Provides:
//! - Initial retrieval with the original question
//! - Model-generated follow-up queries, one per hop
//! - Exact-text deduplication in first-appearance order
//! - Early stop once enough context is gathered
//! - Optional cap on the context handed to the model

use super::MULTI_HOP_ANSWER;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use crate::retrieval::{join_passages, retrieve, Passage, Retriever};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const FOLLOW_UP_QUERY: Signature = Signature {
    name: "follow_up_query",
    instructions: "Generate a search query to find more information.",
    inputs: &[
        FieldSpec::text("context", "Information gathered so far"),
        FieldSpec::text("question", "The original question"),
    ],
    outputs: &[FieldSpec::text(
        "search_query",
        "A search query to find more relevant information",
    )],
    with_rationale: true,
};

/// Multi-hop configuration
#[derive(Debug, Clone)]
pub struct MultiHopConfig {
    /// Passages requested per retrieval
    pub num_passages: usize,

    /// Total retrieval rounds, including the initial one
    pub max_hops: usize,

    /// Cap on the joined context given to the model; oldest passages go first
    pub max_context_chars: Option<usize>,
}

impl Default for MultiHopConfig {
    fn default() -> Self {
        Self {
            num_passages: 3,
            max_hops: 3,
            max_context_chars: None,
        }
    }
}

/// Multi-hop outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHopResult {
    pub answer: String,
    pub reasoning: String,

    /// Context the final answer was generated from
    pub context: String,

    /// Every distinct passage gathered, in first-appearance order
    pub passages: Vec<Passage>,

    /// Retrieval rounds executed, at least 1
    pub hops_used: usize,
}

/// Accumulates distinct passages in first-appearance order
#[derive(Debug, Default)]
struct PassageSet {
    passages: Vec<Passage>,
    seen: HashSet<String>,
}

impl PassageSet {
    /// Add passages not seen before; returns how many were new
    fn extend(&mut self, passages: Vec<Passage>) -> usize {
        let before = self.passages.len();
        for passage in passages {
            if self.seen.insert(passage.text.clone()) {
                self.passages.push(passage);
            }
        }
        self.passages.len() - before
    }

    fn len(&self) -> usize {
        self.passages.len()
    }

    fn context(&self, max_chars: Option<usize>) -> String {
        let texts = self.passages.iter().map(|p| p.text.as_str());
        match max_chars {
            None => join_passages(texts),
            Some(limit) => join_passages(newest_within(texts.collect(), limit)),
        }
    }
}

/// Newest texts whose joined length fits `limit`, in original order.
/// The newest text is always kept.
fn newest_within(texts: Vec<&str>, limit: usize) -> Vec<&str> {
    let mut kept = Vec::new();
    let mut used = 0;

    for text in texts.into_iter().rev() {
        let cost = if kept.is_empty() { text.len() } else { text.len() + 2 };
        if !kept.is_empty() && used + cost > limit {
            break;
        }
        used += cost;
        kept.push(text);
    }

    kept.reverse();
    kept
}

/// Gathers context over several retrieval rounds, then answers
pub struct MultiHopRetriever {
    config: MultiHopConfig,
}

impl MultiHopRetriever {
    pub fn new(config: MultiHopConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        model: &dyn LanguageModel,
        retriever: &dyn Retriever,
        question: &str,
    ) -> Result<MultiHopResult> {
        let num_passages = self.config.num_passages;
        let enough = num_passages * 2;

        let mut gathered = PassageSet::default();
        gathered.extend(retrieve(retriever, question, num_passages).await?);

        let mut context = gathered.context(self.config.max_context_chars);
        let mut rounds = 0;

        for hop in 1..self.config.max_hops {
            let inputs = Inputs::new()
                .with("context", context.as_str())
                .with("question", question);
            let query = predict(model, &FOLLOW_UP_QUERY, &inputs)
                .await?
                .text("search_query");

            let added = gathered.extend(retrieve(retriever, &query, num_passages).await?);
            context = gathered.context(self.config.max_context_chars);
            rounds += 1;

            tracing::debug!(
                hop = hop,
                query = %query,
                new_passages = added,
                total_passages = gathered.len(),
                "Multi-hop expansion"
            );

            if gathered.len() >= enough {
                break;
            }
        }

        let inputs = Inputs::new()
            .with("context", context.as_str())
            .with("question", question);
        let prediction = predict(model, &MULTI_HOP_ANSWER, &inputs).await?;

        let hops_used = 1 + rounds;
        tracing::info!(
            hops_used = hops_used,
            passages = gathered.len(),
            "Multi-hop answer generated"
        );

        Ok(MultiHopResult {
            answer: prediction.text("answer"),
            reasoning: prediction.text("reasoning"),
            context,
            passages: gathered.passages,
            hops_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Prediction, ScriptedModel};
    use crate::retrieval::FixedRetriever;
    use serde_json::json;

    fn responder() -> ScriptedModel {
        ScriptedModel::from_fn(|signature, _| {
            let reply = match signature.name {
                "follow_up_query" => json!({ "search_query": "more" }),
                _ => json!({ "answer": "done", "reasoning": "combined" }),
            };
            Ok(Prediction::from_value(reply))
        })
    }

    fn texts(passages: &[Passage]) -> Vec<&str> {
        passages.iter().map(|p| p.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_overlapping_results_are_deduplicated() {
        let retriever = FixedRetriever::new(vec![
            FixedRetriever::texts(["a", "b", "a"]),
            FixedRetriever::texts(["b", "c"]),
            FixedRetriever::texts(["c", "a", "d"]),
        ]);
        let model = responder();
        let hop = MultiHopRetriever::new(MultiHopConfig {
            num_passages: 3,
            max_hops: 3,
            max_context_chars: None,
        });

        let out = hop.run(&model, &retriever, "q").await.unwrap();
        assert_eq!(texts(&out.passages), vec!["a", "b", "c", "d"]);
        assert_eq!(out.context, "a\n\nb\n\nc\n\nd");
        assert_eq!(out.hops_used, 3);
        assert_eq!(out.answer, "done");
    }

    #[tokio::test]
    async fn test_single_hop_reports_one() {
        let retriever = FixedRetriever::new(vec![FixedRetriever::texts(["a"])]);
        let model = responder();
        let hop = MultiHopRetriever::new(MultiHopConfig {
            max_hops: 1,
            ..Default::default()
        });

        let out = hop.run(&model, &retriever, "q").await.unwrap();
        assert_eq!(out.hops_used, 1);
        assert_eq!(model.call_count(), 1);
        assert_eq!(retriever.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_early_stop_at_twice_num_passages() {
        let retriever = FixedRetriever::new(vec![
            FixedRetriever::texts(["a", "b"]),
            FixedRetriever::texts(["c", "d"]),
            FixedRetriever::texts(["e", "f"]),
        ]);
        let model = responder();
        let hop = MultiHopRetriever::new(MultiHopConfig {
            num_passages: 2,
            max_hops: 5,
            max_context_chars: None,
        });

        let out = hop.run(&model, &retriever, "q").await.unwrap();
        assert_eq!(out.hops_used, 2);
        assert_eq!(texts(&out.passages), vec!["a", "b", "c", "d"]);
        assert_eq!(retriever.queries()[1], ("more".to_string(), 2));
    }

    #[tokio::test]
    async fn test_empty_retrieval_still_answers() {
        let retriever = FixedRetriever::new(vec![]);
        let model = responder();
        let hop = MultiHopRetriever::new(MultiHopConfig::default());

        let out = hop.run(&model, &retriever, "q").await.unwrap();
        assert!(out.passages.is_empty());
        assert_eq!(out.context, "");
        assert_eq!(out.hops_used, 3);
    }

    #[tokio::test]
    async fn test_context_cap_drops_oldest() {
        let retriever = FixedRetriever::new(vec![
            FixedRetriever::texts(["aaaa", "bbbb"]),
            FixedRetriever::texts(["cccc"]),
        ]);
        let model = responder();
        let hop = MultiHopRetriever::new(MultiHopConfig {
            num_passages: 2,
            max_hops: 2,
            max_context_chars: Some(10),
        });

        let out = hop.run(&model, &retriever, "q").await.unwrap();
        assert_eq!(out.context, "bbbb\n\ncccc");
        assert_eq!(out.passages.len(), 3);
    }

    #[test]
    fn test_newest_within_keeps_latest() {
        assert_eq!(newest_within(vec!["a", "bb", "ccc"], 7), vec!["bb", "ccc"]);
        assert_eq!(newest_within(vec!["toolong"], 3), vec!["toolong"]);
        assert!(newest_within(vec![], 3).is_empty());
    }
}
