//! Agent tools
//!
//! A [`Tool`] is a named, described `&str -> String` capability. The
//! [`ToolRegistry`] owns the tools of one agent run and guarantees that
//! execution never fails: executor errors, panics and unknown tool names all
//! come back as observation strings that steer the model on its next step.

mod calculator;
mod json;

pub use calculator::{calculator_tool, evaluate};
pub use json::json_tool;

use crate::metrics;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Executor = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync;

/// A named capability an agent can invoke with a string argument
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    executor: Arc<Executor>,
}

impl Tool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, executor: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            executor: Arc::new(executor),
        }
    }

    /// Declared by the host without an implementation; echoes its input
    pub fn passthrough(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let label = name.clone();
        Self::new(name, description, move |args| {
            Ok(format!("Tool {} not implemented: {}", label, args))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tool({}: {})", self.name, self.description)
    }
}

/// The built-in tools every agent gets
pub fn builtin_tools() -> Vec<Tool> {
    vec![calculator_tool(), json_tool()]
}

/// Tools available to one agent run, in registration order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Build a registry. A later tool with an already registered name replaces
    /// the earlier one in place.
    pub fn new(tools: impl IntoIterator<Item = Tool>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    fn register(&mut self, tool: Tool) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => {
                tracing::warn!(tool = %tool.name, "Duplicate tool name, keeping the last definition");
                *existing = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `- name: description` per tool, for the agent preamble
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run a tool. Never fails; problems are reported in the returned text.
    pub fn execute(&self, name: &str, arguments: &str) -> String {
        let Some(tool) = self.get(name) else {
            metrics::record_tool_call(name, "unknown");
            let available = self
                .tools
                .iter()
                .map(|t| format!("'{}'", t.name))
                .collect::<Vec<_>>()
                .join(", ");
            return format!("Unknown tool: {}. Available: [{}]", name, available);
        };

        let executor = tool.executor.clone();
        let outcome = catch_unwind(AssertUnwindSafe(|| executor(arguments)));

        match outcome {
            Ok(Ok(output)) => {
                metrics::record_tool_call(name, "ok");
                output
            }
            Ok(Err(e)) => {
                metrics::record_tool_call(name, "error");
                tracing::debug!(tool = name, error = %e, "Tool returned an error");
                format!("Error executing {}: {}", name, e)
            }
            Err(panic) => {
                metrics::record_tool_call(name, "panic");
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tool panicked".to_string());
                tracing::warn!(tool = name, error = %message, "Tool panicked");
                format!("Error executing {}: {}", name, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_registered_tool() {
        let registry = ToolRegistry::new(builtin_tools());
        assert_eq!(registry.execute("calculator", "25 * 4 + 100"), "200");
        assert_eq!(registry.names(), vec!["calculator", "json_parser"]);
    }

    #[test]
    fn test_executor_error_becomes_observation() {
        let failing = Tool::new("search", "Search", |_| anyhow::bail!("index offline"));
        let registry = ToolRegistry::new([failing]);
        assert_eq!(
            registry.execute("search", "rust"),
            "Error executing search: index offline"
        );
    }

    #[test]
    fn test_panic_is_contained() {
        let panicking = Tool::new("boom", "Always panics", |_| panic!("kaboom"));
        let registry = ToolRegistry::new([panicking]);
        assert_eq!(registry.execute("boom", ""), "Error executing boom: kaboom");
    }

    #[test]
    fn test_unknown_tool_lists_available() {
        let registry = ToolRegistry::new(builtin_tools());
        assert_eq!(
            registry.execute("weather", "Oslo"),
            "Unknown tool: weather. Available: ['calculator', 'json_parser']"
        );
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let registry = ToolRegistry::new([
            Tool::new("echo", "first", |a| Ok(format!("first {a}"))),
            Tool::new("other", "other", |_| Ok(String::new())),
            Tool::new("echo", "second", |a| Ok(format!("second {a}"))),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["echo", "other"]);
        assert_eq!(registry.execute("echo", "x"), "second x");
        assert_eq!(registry.get("echo").unwrap().description(), "second");
    }

    #[test]
    fn test_passthrough_and_describe() {
        let registry = ToolRegistry::new([Tool::passthrough("weather", "Get the weather")]);
        assert_eq!(
            registry.execute("weather", "Oslo"),
            "Tool weather not implemented: Oslo"
        );
        assert_eq!(registry.describe(), "- weather: Get the weather");
    }
}
