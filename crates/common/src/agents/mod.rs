//! Agents
//!
//! Provides:
//! - ReAct controller (tool-using reason/act loop)
//! - Trajectory line protocol
//! - Code generation agent

mod code;
mod react;
mod trajectory;

pub use code::{CodeAgent, GeneratedCode, DEFAULT_LANGUAGE, GENERATE_CODE};
pub use react::{
    parse_action, AgentAction, ReActConfig, ReActController, ReActResult, Termination,
    EXHAUSTED_ANSWER, REACT_STEP,
};
pub use trajectory::{classify, escape_tagged_lines, LineKind, TrajectoryLine, TrajectoryStep};
