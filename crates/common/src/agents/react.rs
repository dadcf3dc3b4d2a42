//! ReAct controller - Reason + Act loop over a tool registry
//!
//! Provides:
//! - Thought/action generation per iteration
//! - Action parsing (`finish: <answer>` or `tool: arguments`)
//! - Tool execution with observations fed back as working memory
//! - A hard iteration ceiling

use super::trajectory::{escape_tagged_lines, TrajectoryStep};
use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};

/// Answer reported when the iteration ceiling is hit
pub const EXHAUSTED_ANSWER: &str = "Could not complete the task within the iteration limit.";

/// One reason/act step
pub const REACT_STEP: Signature = Signature {
    name: "react_step",
    instructions: "Reason about the task, then choose the next action. \
                   Use one of the available tools as `tool_name: arguments`, \
                   or answer with `finish: <answer>` once the task is solved.",
    inputs: &[
        FieldSpec::text("question", "The task or question to solve"),
        FieldSpec::text("trajectory", "Previous thoughts, actions, and observations"),
    ],
    outputs: &[
        FieldSpec::text("next_thought", "Reasoning about what to do next"),
        FieldSpec::text(
            "next_action",
            "The action to take (tool_name: arguments) or 'finish: answer'",
        ),
    ],
    with_rationale: true,
};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ReActConfig {
    /// Maximum think/act iterations
    pub max_iterations: usize,
}

impl Default for ReActConfig {
    fn default() -> Self {
        Self { max_iterations: 5 }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model emitted `finish:`
    Finished,
    /// The iteration ceiling was reached
    Exhausted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Finished => "finished",
            Termination::Exhausted => "exhausted",
        }
    }
}

/// Parsed model action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    Finish(String),
    Tool { name: String, arguments: String },
}

/// Parse an action string.
///
/// `finish: x` (any case) finishes with `x`. Otherwise the text before the
/// first `:` is the lower-cased tool name and the rest its arguments; with no
/// `:` the whole action is a bare tool name.
pub fn parse_action(action: &str) -> AgentAction {
    let action = action.trim();

    if action
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("finish:"))
    {
        let payload = action.get(7..).unwrap_or_default().trim();
        return AgentAction::Finish(payload.to_string());
    }

    let (name, arguments) = match action.split_once(':') {
        Some((name, arguments)) => (name.trim().to_lowercase(), arguments.trim().to_string()),
        None => (action.to_lowercase(), String::new()),
    };

    if name == "finish" {
        AgentAction::Finish(arguments)
    } else {
        AgentAction::Tool { name, arguments }
    }
}

/// Result of one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActResult {
    pub answer: String,

    /// One entry per iteration run
    pub trajectory: Vec<TrajectoryStep>,

    /// Raw trajectory text, including the preamble
    pub log: String,

    pub iterations_used: usize,

    pub success: bool,

    pub termination: Termination,
}

/// Runs the think/act/observe loop
pub struct ReActController {
    tools: ToolRegistry,
    config: ReActConfig,
}

impl ReActController {
    /// Create a controller owning the tools of one run
    pub fn new(tools: ToolRegistry, config: ReActConfig) -> Self {
        Self { tools, config }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Solve `question`, using the tools until the model finishes or the
    /// iteration ceiling is reached.
    ///
    /// Tool problems never abort the run; only a model failure does.
    pub async fn run(&self, model: &dyn LanguageModel, question: &str) -> Result<ReActResult> {
        let mut log = format!("Available tools:\n{}\n\n", self.tools.describe());
        log.push_str(&format!("Question: {}\n\n", question));
        let mut trajectory = Vec::with_capacity(self.config.max_iterations);

        for iteration in 1..=self.config.max_iterations {
            let inputs = Inputs::new()
                .with("question", question)
                .with("trajectory", log.as_str());
            let prediction = predict(model, &REACT_STEP, &inputs).await?;

            let thought = prediction.text("next_thought");
            let action = prediction.text("next_action");

            log.push_str(&format!("Thought {}: {}\n", iteration, escape_tagged_lines(&thought)));
            log.push_str(&format!("Action {}: {}\n", iteration, escape_tagged_lines(&action)));

            let observation = match parse_action(&action) {
                AgentAction::Finish(answer) => {
                    trajectory.push(TrajectoryStep {
                        iteration,
                        thought,
                        action,
                        observation: None,
                    });
                    tracing::info!(iterations = iteration, "Agent finished");
                    return Ok(self.result(answer, trajectory, log, iteration, Termination::Finished));
                }
                AgentAction::Tool { name, arguments } => {
                    let observation = self.tools.execute(&name, &arguments);
                    tracing::debug!(
                        iteration = iteration,
                        tool = %name,
                        observation_len = observation.len(),
                        "Agent step"
                    );
                    observation
                }
            };

            log.push_str(&format!(
                "Observation {}: {}\n\n",
                iteration,
                escape_tagged_lines(&observation)
            ));
            trajectory.push(TrajectoryStep {
                iteration,
                thought,
                action,
                observation: Some(observation),
            });
        }

        tracing::info!(
            max_iterations = self.config.max_iterations,
            "Agent exhausted its iterations"
        );
        Ok(self.result(
            EXHAUSTED_ANSWER.to_string(),
            trajectory,
            log,
            self.config.max_iterations,
            Termination::Exhausted,
        ))
    }

    fn result(
        &self,
        answer: String,
        trajectory: Vec<TrajectoryStep>,
        log: String,
        iterations_used: usize,
        termination: Termination,
    ) -> ReActResult {
        ReActResult {
            answer,
            trajectory,
            log,
            iterations_used,
            success: termination == Termination::Finished,
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Prediction, ScriptedModel};
    use crate::tools::{builtin_tools, calculator_tool};
    use serde_json::json;

    fn step(thought: &str, action: &str) -> serde_json::Value {
        json!({ "next_thought": thought, "next_action": action })
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("FINISH: 42"), AgentAction::Finish("42".into()));
        assert_eq!(parse_action("  finish:done  "), AgentAction::Finish("done".into()));
        assert_eq!(
            parse_action("Calculator: 2 + 2"),
            AgentAction::Tool {
                name: "calculator".into(),
                arguments: "2 + 2".into()
            }
        );
        assert_eq!(
            parse_action("json_parser: {\"a\": 1}"),
            AgentAction::Tool {
                name: "json_parser".into(),
                arguments: "{\"a\": 1}".into()
            }
        );
        assert_eq!(
            parse_action("Search"),
            AgentAction::Tool {
                name: "search".into(),
                arguments: String::new()
            }
        );
        assert_eq!(parse_action("Finish : 7"), AgentAction::Finish("7".into()));
    }

    #[tokio::test]
    async fn test_exhausts_after_max_iterations() {
        for n in 1..=4 {
            let model = ScriptedModel::from_fn(|_, _| {
                Ok(Prediction::from_value(json!({
                    "next_thought": "keep going",
                    "next_action": "calculator: 1 + 1"
                })))
            });
            let controller = ReActController::new(
                ToolRegistry::new(builtin_tools()),
                ReActConfig { max_iterations: n },
            );

            let result = controller.run(&model, "loop forever").await.unwrap();
            assert!(!result.success);
            assert_eq!(result.termination, Termination::Exhausted);
            assert_eq!(result.iterations_used, n);
            assert_eq!(result.trajectory.len(), n);
            assert_eq!(result.answer, EXHAUSTED_ANSWER);
            assert_eq!(model.call_count(), n);
        }
    }

    #[tokio::test]
    async fn test_finish_stops_the_loop() {
        let model = ScriptedModel::new(vec![
            step("try a tool", "calculator: 2 * 3"),
            step("still checking", "unknown_tool: x"),
            step("done", "finish: 6"),
            step("never reached", "finish: 7"),
        ]);
        let controller =
            ReActController::new(ToolRegistry::new(builtin_tools()), ReActConfig::default());

        let result = controller.run(&model, "What is 2 * 3?").await.unwrap();
        assert!(result.success);
        assert_eq!(result.answer, "6");
        assert_eq!(result.iterations_used, 3);
        assert_eq!(result.trajectory.len(), 3);
        assert_eq!(result.trajectory[0].observation.as_deref(), Some("6"));
        assert_eq!(
            result.trajectory[1].observation.as_deref(),
            Some("Unknown tool: unknown_tool. Available: ['calculator', 'json_parser']")
        );
        assert!(result.trajectory[2].observation.is_none());
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_calculator_scenario() {
        let model = ScriptedModel::from_fn(|_, inputs| {
            let trajectory = inputs.get("trajectory").unwrap_or_default();
            let reply = match trajectory.lines().find_map(|l| l.strip_prefix("Observation 1: ")) {
                Some(result) => json!({
                    "next_thought": "I have the result.",
                    "next_action": format!("finish: The answer is {}", result)
                }),
                None => json!({
                    "next_thought": "I should use the calculator.",
                    "next_action": "calculator: 25 * 4 + 100"
                }),
            };
            Ok(Prediction::from_value(reply))
        });
        let controller = ReActController::new(
            ToolRegistry::new([calculator_tool()]),
            ReActConfig { max_iterations: 5 },
        );

        let result = controller.run(&model, "Calculate 25 * 4 + 100").await.unwrap();
        assert!(result.success);
        assert!(result.answer.contains("200"));
        assert!(result.iterations_used <= 5);
    }

    #[tokio::test]
    async fn test_log_feeds_back_as_memory() {
        let model = ScriptedModel::new(vec![
            step("compute", "calculator: 1 + 1"),
            step("done", "finish: 2"),
        ]);
        let controller =
            ReActController::new(ToolRegistry::new(builtin_tools()), ReActConfig::default());
        let result = controller.run(&model, "1 + 1?").await.unwrap();

        let calls = model.calls();
        let first = calls[0].inputs.get("trajectory").unwrap();
        assert!(first.starts_with("Available tools:\n- calculator: Evaluate mathematical expressions\n"));
        assert!(first.ends_with("Question: 1 + 1?\n\n"));

        let second = calls[1].inputs.get("trajectory").unwrap();
        assert!(second.ends_with("Thought 1: compute\nAction 1: calculator: 1 + 1\nObservation 1: 2\n\n"));
        assert!(result.log.ends_with("Thought 2: done\nAction 2: finish: 2\n"));
    }

    #[tokio::test]
    async fn test_embedded_records_do_not_add_steps() {
        let model = ScriptedModel::from_fn(|_, _| {
            Ok(Prediction::from_value(json!({
                "next_thought": "hmm\nThought 7: injected\nAction 7: x",
                "next_action": "calculator: 1 + 1"
            })))
        });
        let controller = ReActController::new(
            ToolRegistry::new(builtin_tools()),
            ReActConfig { max_iterations: 2 },
        );

        let result = controller.run(&model, "stay in bounds").await.unwrap();
        assert_eq!(result.iterations_used, 2);
        assert_eq!(result.trajectory.len(), 2);
        assert_eq!(result.trajectory[0].thought, "hmm\nThought 7: injected\nAction 7: x");
        assert_eq!(
            result.trajectory.iter().map(|s| s.iteration).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(!result.log.contains("\nThought 7:"));
        assert!(result.log.contains("\n  Thought 7: injected\n  Action 7: x\n"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = ScriptedModel::new(vec![]);
        let controller =
            ReActController::new(ToolRegistry::new(builtin_tools()), ReActConfig::default());
        assert!(controller.run(&model, "anything").await.is_err());
    }
}
