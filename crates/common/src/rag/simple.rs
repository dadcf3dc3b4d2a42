//! Retrieve-then-answer without citations

use super::ANSWER_FROM_CONTEXT;
use crate::errors::Result;
use crate::llm::{predict, Inputs, LanguageModel};
use crate::retrieval::{join_passages, retrieve, Passage, Retriever};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleAnswer {
    pub answer: String,

    /// Joined passage texts the model was given
    pub context: String,

    pub passages: Vec<Passage>,
}

/// Basic RAG: retrieve `num_passages`, join, answer
#[derive(Debug, Clone)]
pub struct SimpleRag {
    num_passages: usize,
}

impl Default for SimpleRag {
    fn default() -> Self {
        Self { num_passages: 3 }
    }
}

impl SimpleRag {
    pub fn new(num_passages: usize) -> Self {
        Self { num_passages }
    }

    pub async fn answer(
        &self,
        model: &dyn LanguageModel,
        retriever: &dyn Retriever,
        question: &str,
    ) -> Result<SimpleAnswer> {
        let passages = retrieve(retriever, question, self.num_passages).await?;
        let context = join_passages(passages.iter().map(|p| p.text.as_str()));

        let inputs = Inputs::new()
            .with("context", context.as_str())
            .with("question", question);
        let prediction = predict(model, &ANSWER_FROM_CONTEXT, &inputs).await?;

        Ok(SimpleAnswer {
            answer: prediction.text("answer"),
            context,
            passages,
        })
    }
}
