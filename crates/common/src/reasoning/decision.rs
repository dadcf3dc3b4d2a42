//! Confidence-scored decision making

use crate::confidence;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use serde::{Deserialize, Serialize};

pub const MAKE_DECISION: Signature = Signature {
    name: "make_decision",
    instructions: "Make a decision with confidence scoring.",
    inputs: &[
        FieldSpec::text("situation", "The situation requiring a decision"),
        FieldSpec::text("options", "Available options to choose from"),
        FieldSpec::text("constraints", "Constraints or requirements"),
    ],
    outputs: &[
        FieldSpec::text("decision", "The recommended decision"),
        FieldSpec::text("rationale", "Detailed rationale for the decision"),
        FieldSpec::float("confidence", "Confidence in this decision (0.0 to 1.0)"),
        FieldSpec::list("risks", "Potential risks of this decision"),
    ],
    with_rationale: false,
};

/// Decision maker configuration
#[derive(Debug, Clone)]
pub struct DecisionConfig {
    /// Confidence a decision needs to meet the threshold
    pub min_confidence: f32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self { min_confidence: 0.7 }
    }
}

/// A scored decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision: String,
    pub rationale: String,

    /// Always in [0, 1]
    pub confidence: f32,

    pub risks: Vec<String>,

    /// `confidence >= min_confidence`
    pub meets_threshold: bool,
}

/// Picks among options and scores its confidence
pub struct DecisionMaker {
    config: DecisionConfig,
}

impl DecisionMaker {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub async fn decide(
        &self,
        model: &dyn LanguageModel,
        situation: &str,
        options: &str,
        constraints: &str,
    ) -> Result<Decision> {
        let inputs = Inputs::new()
            .with("situation", situation)
            .with("options", options)
            .with("constraints", constraints);
        let prediction = predict(model, &MAKE_DECISION, &inputs).await?;

        let confidence = confidence::normalize(prediction.raw("confidence"));
        let meets_threshold = confidence >= self.config.min_confidence;

        tracing::debug!(
            confidence = confidence,
            min_confidence = self.config.min_confidence,
            meets_threshold = meets_threshold,
            "Decision scored"
        );

        Ok(Decision {
            decision: prediction.text("decision"),
            rationale: prediction.text("rationale"),
            confidence,
            risks: prediction.list("risks"),
            meets_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_threshold_and_list_coercion() {
        let model = ScriptedModel::new(vec![
            json!({
                "decision": "Soft delete",
                "rationale": "Reversible",
                "confidence": 0.85,
                "risks": ["Storage cost"],
            }),
            json!({
                "decision": "Hard delete",
                "rationale": "GDPR",
                "confidence": "0.4",
                "risks": "data loss",
            }),
        ]);
        let maker = DecisionMaker::new(DecisionConfig::default());

        let first = maker
            .decide(&model, "Delete account", "1. Soft, 2. Hard", "GDPR")
            .await
            .unwrap();
        assert!(first.meets_threshold);
        assert_eq!(first.risks, vec!["Storage cost".to_string()]);

        let second = maker.decide(&model, "Delete account", "1. Soft, 2. Hard", "").await.unwrap();
        assert!(!second.meets_threshold);
        assert_eq!(second.confidence, 0.4);
        assert!(second.risks.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_confidence_uses_default() {
        let model = ScriptedModel::new(vec![json!({ "decision": "A", "confidence": null })]);
        let maker = DecisionMaker::new(DecisionConfig { min_confidence: 0.5 });
        let out = maker.decide(&model, "s", "A or B", "").await.unwrap();
        assert_eq!(out.confidence, 0.5);
        assert!(out.meets_threshold);
    }
}
