//! Retrieval-augmented answering
//!
//! Provides:
//! - Simple RAG (retrieve, join, answer)
//! - Cited RAG (source markers, model citations and confidence)
//! - Grounded RAG (source metadata, retrieval-derived confidence)
//! - Multi-hop retrieval with follow-up queries

mod cited;
mod grounded;
mod multi_hop;
mod simple;

pub use cited::{CitedAnswer, CitedRag, CITED_ANSWER, INSUFFICIENT_INFORMATION};
pub use grounded::{
    aggregate_confidence, excerpt, GroundedAnswer, GroundedRag, GroundedRagConfig, Source,
    NO_DOCUMENTS_CONTEXT, NO_SOURCES_CONFIDENCE, UNSCORED_RELEVANCE,
};
pub use multi_hop::{MultiHopConfig, MultiHopResult, MultiHopRetriever, FOLLOW_UP_QUERY};
pub use simple::{SimpleAnswer, SimpleRag};

use crate::llm::{FieldSpec, Signature};

/// Answer a question from retrieved context
pub const ANSWER_FROM_CONTEXT: Signature = Signature {
    name: "answer_from_context",
    instructions: "Answer questions based on retrieved context.",
    inputs: &[
        FieldSpec::text("context", "Retrieved passages relevant to the question"),
        FieldSpec::text("question", "The user's question"),
    ],
    outputs: &[FieldSpec::text("answer", "A detailed answer based on the context")],
    with_rationale: true,
};

/// Final answer over everything gathered across hops
pub const MULTI_HOP_ANSWER: Signature = Signature {
    name: "multi_hop_answer",
    instructions: "Synthesize a final answer from multiple retrieval hops.",
    inputs: &[
        FieldSpec::text("context", "All gathered information from multiple searches"),
        FieldSpec::text("question", "The original question"),
    ],
    outputs: &[
        FieldSpec::text("answer", "A comprehensive answer synthesizing all information"),
        FieldSpec::text("reasoning", "Explanation of how the answer was derived"),
    ],
    with_rationale: true,
};
