//! Code generation agent

use crate::errors::Result;
use crate::llm::{predict, FieldSpec, Inputs, LanguageModel, Signature};
use serde::{Deserialize, Serialize};

/// Language used when the caller does not name one
pub const DEFAULT_LANGUAGE: &str = "python";

pub const GENERATE_CODE: Signature = Signature {
    name: "generate_code",
    instructions: "Generate code to solve a problem.",
    inputs: &[
        FieldSpec::text("task", "Description of what the code should do"),
        FieldSpec::text("language", "Programming language to use"),
    ],
    outputs: &[
        FieldSpec::text("code", "The generated code"),
        FieldSpec::text("explanation", "Explanation of how the code works"),
    ],
    with_rationale: true,
};

/// Generated code and its explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub code: String,
    pub explanation: String,
    pub language: String,
}

/// Writes code for a task description
#[derive(Debug, Clone, Default)]
pub struct CodeAgent;

impl CodeAgent {
    pub fn new() -> Self {
        Self
    }

    /// Generate code for `task` in `language` (defaults to python when blank)
    pub async fn generate(
        &self,
        model: &dyn LanguageModel,
        task: &str,
        language: &str,
    ) -> Result<GeneratedCode> {
        let language = match language.trim() {
            "" => DEFAULT_LANGUAGE,
            other => other,
        };

        let inputs = Inputs::new().with("task", task).with("language", language);
        let prediction = predict(model, &GENERATE_CODE, &inputs).await?;

        Ok(GeneratedCode {
            code: prediction.text("code"),
            explanation: prediction.text("explanation"),
            language: language.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_defaults_language() {
        let model = ScriptedModel::new(vec![json!({
            "code": "def fib(n): ...",
            "explanation": "Recursive fibonacci",
        })]);

        let out = CodeAgent::new().generate(&model, "fibonacci", "  ").await.unwrap();
        assert_eq!(out.language, "python");
        assert_eq!(out.code, "def fib(n): ...");
        assert_eq!(model.calls()[0].inputs.get("language"), Some("python"));
    }

    #[tokio::test]
    async fn test_generate_keeps_language() {
        let model = ScriptedModel::new(vec![json!({ "code": "fn main() {}", "explanation": "" })]);
        let out = CodeAgent::new().generate(&model, "hello", "rust").await.unwrap();
        assert_eq!(out.language, "rust");
        assert_eq!(out.explanation, "");
    }
}
