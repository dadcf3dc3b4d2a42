//! Structured reasoning patterns
//!
//! Provides:
//! - Chain-of-thought and direct answering
//! - Tree-of-thought exploration with synthesis
//! - Confidence-scored decisions
//! - Topic analysis

mod analysis;
mod chain_of_thought;
mod decision;
mod tree_of_thought;

pub use analysis::{Analysis, Analyzer, ANALYZE_TOPIC};
pub use chain_of_thought::{
    BasicAnswer, ChainOfThought, ReasonedAnswer, DIRECT_ANSWER, DIRECT_CONFIDENCE,
    DIRECT_REASONING, STEP_BY_STEP,
};
pub use decision::{Decision, DecisionConfig, DecisionMaker, MAKE_DECISION};
pub use tree_of_thought::{
    summarize_branches, Approach, Branch, ExplorationStrategy, TreeOfThoughtConfig,
    TreeOfThoughtOrchestrator, TreeOfThoughtResult, EXPLORE_BRANCH, SYNTHESIZE_BRANCHES,
};
