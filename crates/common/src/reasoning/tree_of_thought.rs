//! Tree-of-thought orchestrator
//!
//! Provides:
//! - A fixed catalog of exploration approaches
//! - Independent branch exploration with viability scoring
//! - Synthesis over every explored branch
//!
//! Branches are explored sequentially by default. The concurrent strategy runs
//! branch calls through a bounded, ordered stream and waits for all of them
//! before synthesis, so branch order is catalog order either way.

use crate::confidence;
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

pub const EXPLORE_BRANCH: Signature = Signature {
    name: "explore_branch",
    instructions: "Generate a branch of thought for tree-of-thought reasoning.",
    inputs: &[
        FieldSpec::text("problem", "The problem to solve"),
        FieldSpec::text("approach", "The specific approach to explore"),
    ],
    outputs: &[
        FieldSpec::text("reasoning", "Reasoning following this approach"),
        FieldSpec::text("conclusion", "Conclusion from this approach"),
        FieldSpec::float("viability", "How viable is this approach (0.0 to 1.0)"),
    ],
    with_rationale: true,
};

pub const SYNTHESIZE_BRANCHES: Signature = Signature {
    name: "synthesize_branches",
    instructions: "Synthesize multiple thought branches into a final answer.",
    inputs: &[
        FieldSpec::text("problem", "The original problem"),
        FieldSpec::text("branches", "Summary of all explored approaches and conclusions"),
    ],
    outputs: &[
        FieldSpec::text("best_approach", "The best approach identified"),
        FieldSpec::text("final_answer", "The synthesized final answer"),
        FieldSpec::text("reasoning", "Why this answer is best"),
    ],
    with_rationale: true,
};

/// Exploration approaches, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approach {
    Straightforward,
    Unconventional,
    RobustScalable,
    FastestToImplement,
    MostMaintainable,
}

impl Approach {
    pub const CATALOG: &'static [Approach] = &[
        Approach::Straightforward,
        Approach::Unconventional,
        Approach::RobustScalable,
        Approach::FastestToImplement,
        Approach::MostMaintainable,
    ];

    /// Text handed to the model as the approach to explore
    pub fn description(&self) -> &'static str {
        match self {
            Approach::Straightforward => "the most straightforward solution",
            Approach::Unconventional => "an unconventional or creative approach",
            Approach::RobustScalable => "the most robust and scalable solution",
            Approach::FastestToImplement => "the fastest to implement",
            Approach::MostMaintainable => "the most maintainable long-term",
        }
    }

    /// The first `n` approaches of the catalog
    pub fn select(n: usize) -> &'static [Approach] {
        &Self::CATALOG[..n.min(Self::CATALOG.len())]
    }
}

/// One explored reasoning path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    /// Approach description as given to the model
    pub approach: String,
    pub reasoning: String,
    pub conclusion: String,

    /// Always in [0, 1]
    pub viability: f32,
}

/// How branches are explored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplorationStrategy {
    /// One branch call after another
    #[default]
    Sequential,

    /// Up to `max_workers` branch calls in flight
    Concurrent { max_workers: usize },
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct TreeOfThoughtConfig {
    /// Branches to explore, capped at the catalog size
    pub num_branches: usize,

    pub strategy: ExplorationStrategy,
}

impl Default for TreeOfThoughtConfig {
    fn default() -> Self {
        Self {
            num_branches: 3,
            strategy: ExplorationStrategy::Sequential,
        }
    }
}

/// Outcome of a tree-of-thought run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeOfThoughtResult {
    pub branches: Vec<Branch>,

    /// The summary text synthesis was given
    pub branches_summary: String,

    pub best_approach: String,
    pub final_answer: String,
    pub reasoning: String,
}

/// Render branches the way synthesis sees them
pub fn summarize_branches(branches: &[Branch]) -> String {
    branches
        .iter()
        .map(|b| {
            format!(
                "Approach: {}\nReasoning: {}\nConclusion: {}\nViability: {:.2}",
                b.approach, b.reasoning, b.conclusion, b.viability
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Explores several approaches, then picks and justifies a winner
pub struct TreeOfThoughtOrchestrator {
    config: TreeOfThoughtConfig,
}

impl TreeOfThoughtOrchestrator {
    pub fn new(config: TreeOfThoughtConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, model: &dyn LanguageModel, problem: &str) -> Result<TreeOfThoughtResult> {
        let approaches = Approach::select(self.config.num_branches);

        let branches: Vec<Branch> = match self.config.strategy {
            ExplorationStrategy::Sequential => {
                let mut branches = Vec::with_capacity(approaches.len());
                for approach in approaches {
                    branches.push(explore(model, problem, *approach).await?);
                }
                branches
            }
            ExplorationStrategy::Concurrent { max_workers } => {
                stream::iter(approaches.iter().copied())
                    .map(|approach| explore(model, problem, approach))
                    .buffered(max_workers.max(1))
                    .try_collect()
                    .await?
            }
        };

        let branches_summary = summarize_branches(&branches);

        let inputs = Inputs::new()
            .with("problem", problem)
            .with("branches", branches_summary.as_str());
        let synthesis = predict(model, &SYNTHESIZE_BRANCHES, &inputs).await?;

        let best_approach = synthesis.text("best_approach");
        tracing::info!(
            branches = branches.len(),
            best_approach = %best_approach,
            "Tree of thought synthesized"
        );

        Ok(TreeOfThoughtResult {
            branches,
            branches_summary,
            best_approach,
            final_answer: synthesis.text("final_answer"),
            reasoning: synthesis.text("reasoning"),
        })
    }
}

async fn explore(model: &dyn LanguageModel, problem: &str, approach: Approach) -> Result<Branch> {
    let inputs = Inputs::new()
        .with("problem", problem)
        .with("approach", approach.description());
    let prediction = predict(model, &EXPLORE_BRANCH, &inputs).await?;

    let branch = Branch {
        approach: approach.description().to_string(),
        reasoning: prediction.text("reasoning"),
        conclusion: prediction.text("conclusion"),
        viability: confidence::normalize(prediction.raw("viability")),
    };

    tracing::debug!(approach = ?approach, viability = branch.viability, "Branch explored");
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Prediction, ScriptedModel};
    use serde_json::json;

    fn branch_then_synthesis() -> ScriptedModel {
        ScriptedModel::from_fn(|signature, inputs| {
            let reply = match signature.name {
                "explore_branch" => json!({
                    "reasoning": format!("exploring {}", inputs.get("approach").unwrap_or_default()),
                    "conclusion": "works",
                    "viability": 0.6,
                }),
                _ => json!({
                    "best_approach": "the most straightforward solution",
                    "final_answer": "Use a cache",
                    "reasoning": "Simplest",
                }),
            };
            Ok(Prediction::from_value(reply))
        })
    }

    #[tokio::test]
    async fn test_three_branches_in_catalog_order() {
        let model = branch_then_synthesis();
        let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig::default());

        let result = tot.run(&model, "Design a caching strategy").await.unwrap();
        let approaches: Vec<_> = result.branches.iter().map(|b| b.approach.as_str()).collect();
        assert_eq!(
            approaches,
            vec![
                "the most straightforward solution",
                "an unconventional or creative approach",
                "the most robust and scalable solution",
            ]
        );
        assert_eq!(result.final_answer, "Use a cache");
        assert_eq!(model.call_count(), 4);
    }

    #[tokio::test]
    async fn test_branch_count_capped_by_catalog() {
        let model = branch_then_synthesis();
        let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig {
            num_branches: 9,
            ..Default::default()
        });
        let result = tot.run(&model, "p").await.unwrap();
        assert_eq!(result.branches.len(), 5);
    }

    #[tokio::test]
    async fn test_malformed_viability_defaults() {
        let model = ScriptedModel::new(vec![
            json!({ "reasoning": "a", "conclusion": "x", "viability": "not sure" }),
            json!({ "reasoning": "b", "conclusion": "y", "viability": 0.91 }),
            json!({ "best_approach": "b", "final_answer": "y", "reasoning": "better" }),
        ]);
        let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig {
            num_branches: 2,
            ..Default::default()
        });

        let result = tot.run(&model, "p").await.unwrap();
        assert_eq!(result.branches[0].viability, 0.5);
        assert_eq!(result.branches[1].viability, 0.91);
        assert_eq!(
            result.branches_summary,
            "Approach: the most straightforward solution\nReasoning: a\nConclusion: x\nViability: 0.50\n\n\
             Approach: an unconventional or creative approach\nReasoning: b\nConclusion: y\nViability: 0.91"
        );

        // synthesis sees every branch, including the weak one
        let synthesis_input = model.calls()[2].inputs.get("branches").unwrap().to_string();
        assert_eq!(synthesis_input, result.branches_summary);
    }

    #[tokio::test]
    async fn test_concurrent_keeps_catalog_order() {
        let model = branch_then_synthesis();
        let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig {
            num_branches: 4,
            strategy: ExplorationStrategy::Concurrent { max_workers: 2 },
        });

        let result = tot.run(&model, "p").await.unwrap();
        let expected: Vec<_> = Approach::select(4).iter().map(|a| a.description()).collect();
        let actual: Vec<_> = result.branches.iter().map(|b| b.approach.as_str()).collect();
        assert_eq!(actual, expected);
        assert_eq!(model.call_count(), 5);
    }

    #[tokio::test]
    async fn test_branch_failure_aborts() {
        let model = ScriptedModel::new(vec![json!({ "reasoning": "a", "conclusion": "x", "viability": 1 })]);
        let tot = TreeOfThoughtOrchestrator::new(TreeOfThoughtConfig::default());
        assert!(tot.run(&model, "p").await.is_err());
    }

    #[test]
    fn test_approach_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(Approach::RobustScalable).unwrap(),
            json!("robust-scalable")
        );
    }
}
