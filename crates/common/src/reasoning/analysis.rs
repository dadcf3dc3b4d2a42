//! Topic analysis

use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use serde::{Deserialize, Serialize};

pub const ANALYZE_TOPIC: Signature = Signature {
    name: "analyze_topic",
    instructions: "Deep analysis of a topic or problem.",
    inputs: &[
        FieldSpec::text("topic", "The topic or problem to analyze"),
        FieldSpec::text("context", "Additional context or constraints"),
    ],
    outputs: &[
        FieldSpec::text("analysis", "Detailed analysis with multiple perspectives"),
        FieldSpec::list("key_points", "List of key takeaways"),
        FieldSpec::list("recommendations", "Actionable recommendations"),
    ],
    with_rationale: true,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis: String,
    pub key_points: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Multi-perspective analysis of a topic
#[derive(Debug, Clone, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub async fn analyze(
        &self,
        model: &dyn LanguageModel,
        topic: &str,
        context: &str,
    ) -> Result<Analysis> {
        let inputs = Inputs::new().with("topic", topic).with("context", context);
        let prediction = predict(model, &ANALYZE_TOPIC, &inputs).await?;

        Ok(Analysis {
            analysis: prediction.text("analysis"),
            key_points: prediction.list("key_points"),
            recommendations: prediction.list("recommendations"),
        })
    }
}
