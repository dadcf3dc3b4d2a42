//! JSON parse/pretty-print tool

use super::Tool;

/// `json_parser`: re-indents valid JSON, reports why invalid JSON failed
pub fn json_tool() -> Tool {
    Tool::new("json_parser", "Parse and format JSON data", |input| {
        let formatted = match serde_json::from_str::<serde_json::Value>(input.trim()) {
            Ok(value) => serde_json::to_string_pretty(&value)?,
            Err(e) => format!("Invalid JSON: {}", e),
        };
        Ok(formatted)
    })
}
