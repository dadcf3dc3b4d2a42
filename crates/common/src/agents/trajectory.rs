//! Trajectory line protocol
//!
//! The agent log is plain text with one tagged record per line:
//! `Thought N: …`, `Action N: …`, `Observation N: …`. Untagged lines continue
//! the record above them, so embedded text must never start a record.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;

/// One think/act/observe step of an agent run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// 1-based iteration number
    pub iteration: usize,

    pub thought: String,

    pub action: String,

    /// Absent for the final `finish:` step
    pub observation: Option<String>,
}

/// Tag of a protocol line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Thought,
    Action,
    Observation,
}

/// A single line of the log, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrajectoryLine<'a> {
    Tagged {
        kind: LineKind,
        iteration: usize,
        text: &'a str,
    },
    Untagged(&'a str),
}

fn line_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(Thought|Action|Observation) (\d+): ?(.*)$").ok())
        .as_ref()
}

/// Classify one line
pub fn classify(line: &str) -> TrajectoryLine<'_> {
    let Some(caps) = line_pattern().and_then(|re| re.captures(line)) else {
        return TrajectoryLine::Untagged(line);
    };

    let kind = match caps.get(1).map(|m| m.as_str()) {
        Some("Thought") => LineKind::Thought,
        Some("Action") => LineKind::Action,
        _ => LineKind::Observation,
    };
    let iteration = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<usize>().ok());
    let text = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

    match iteration {
        Some(iteration) => TrajectoryLine::Tagged { kind, iteration, text },
        None => TrajectoryLine::Untagged(line),
    }
}

/// Indent any embedded line of `text` that would read as a tagged record.
///
/// Model output and tool observations are written into the log verbatim, so
/// a thought containing `\nAction 7: x` would otherwise forge a record.
pub fn escape_tagged_lines(text: &str) -> Cow<'_, str> {
    if !text.lines().skip(1).any(|l| matches!(classify(l), TrajectoryLine::Tagged { .. })) {
        return Cow::Borrowed(text);
    }

    let escaped = text
        .lines()
        .enumerate()
        .map(|(i, line)| match classify(line) {
            TrajectoryLine::Tagged { .. } if i > 0 => format!("  {}", line),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    Cow::Owned(escaped)
}
