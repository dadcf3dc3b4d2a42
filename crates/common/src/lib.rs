//! ReasonForge Common Library
//!
//! Orchestration core and shared code for the ReasonForge services including:
//! - Tool registry with built-in tools
//! - ReAct agent, tree-of-thought and chain-of-thought reasoning
//! - Retrieval-augmented answering (simple, cited, grounded, multi-hop)
//! - Language model and retriever abstractions
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod agents;
pub mod config;
pub mod confidence;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod rag;
pub mod reasoning;
pub mod retrieval;
pub mod tools;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use engine::Engine;
pub use llm::{LanguageModel, LanguageModelProvider};
pub use retrieval::Retriever;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
