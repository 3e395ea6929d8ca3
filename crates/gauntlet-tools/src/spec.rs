// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Tool and toolkit specifications.
//!
//! A tool is pure specification: name, prose, an input schema, an output
//! schema, and the error kinds a real implementation could raise.  Nothing
//! here executes — execution is always simulated by the grounding layer.

use serde_json::Value;

/// How much of a toolkit's specification to render into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    /// Tool names and one-line summaries.
    Low,
    /// Arguments and returns per tool.
    Medium,
    /// Arguments, returns, and exceptions per tool.
    High,
}

/// The specification of one virtual tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    /// The toolkit this tool belongs to.
    pub toolkit: String,
    /// One-line summary shown in low-detail listings.
    pub summary: String,
    /// Full prose description shown to the observation simulator.
    pub description: String,
    /// JSON schema of the input object.
    pub input_schema: Value,
    /// JSON schema of the output object.
    pub output_schema: Value,
    /// Exception names a real implementation could raise.
    pub error_kinds: Vec<String>,
}

impl ToolSpec {
    /// Render the argument specification as an indented list.
    pub fn describe_arguments(&self) -> String {
        describe_schema_fields(&self.input_schema)
    }

    /// Render the return specification as an indented list.
    pub fn describe_returns(&self) -> String {
        describe_schema_fields(&self.output_schema)
    }

    /// Render this tool at the given detail level.
    pub fn describe(&self, level: DetailLevel) -> String {
        match level {
            DetailLevel::Low => format!("* {}: {}", self.name, self.summary),
            DetailLevel::Medium => format!(
                "* {}: {}\n  Arguments:\n{}\n  Returns:\n{}",
                self.name,
                self.summary,
                self.describe_arguments(),
                self.describe_returns(),
            ),
            DetailLevel::High => format!(
                "* {}: {}\n  Arguments:\n{}\n  Returns:\n{}\n  Exceptions: {}",
                self.name,
                self.summary,
                self.describe_arguments(),
                self.describe_returns(),
                if self.error_kinds.is_empty() {
                    "none".to_string()
                } else {
                    self.error_kinds.join(", ")
                },
            ),
        }
    }
}

/// Render a JSON object schema's properties as `  - name (type, required): description` lines.
fn describe_schema_fields(schema: &Value) -> String {
    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let Some(props) = schema["properties"].as_object() else {
        return "    (no fields)".to_string();
    };
    props
        .iter()
        .map(|(name, field)| {
            let ty = field["type"].as_str().unwrap_or("any");
            let req = if required.contains(&name.as_str()) { "required" } else { "optional" };
            let desc = field["description"].as_str().unwrap_or("");
            format!("    - {name} ({ty}, {req}): {desc}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A named collection of related tools.
#[derive(Debug, Clone)]
pub struct Toolkit {
    pub name: String,
    pub description: String,
    pub tools: Vec<ToolSpec>,
}

impl Toolkit {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), tools: Vec::new() }
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Render this toolkit at the given detail level.
    pub fn describe(&self, level: DetailLevel) -> String {
        let tools = self
            .tools
            .iter()
            .map(|t| t.describe(level))
            .collect::<Vec<_>>()
            .join("\n");
        format!("<{}> toolkit: {}\n{}", self.name, self.description, tools)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tool() -> ToolSpec {
        ToolSpec {
            name: "VenmoSendMoney".into(),
            toolkit: "Venmo".into(),
            summary: "Send money to another user.".into(),
            description: "Send money to another Venmo user.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "recipient_username": {"type": "string", "description": "The recipient."},
                    "amount": {"type": "number", "description": "Amount in USD."},
                    "note": {"type": "string", "description": "Optional note."}
                },
                "required": ["recipient_username", "amount"]
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "success": {"type": "boolean", "description": "Whether it worked."},
                    "transaction_id": {"type": "string", "description": "Transaction id."}
                },
                "required": ["success"]
            }),
            error_kinds: vec!["InvalidRequestException".into(), "NotFoundException".into()],
        }
    }

    #[test]
    fn low_detail_is_name_and_summary_only() {
        let text = sample_tool().describe(DetailLevel::Low);
        assert!(text.contains("VenmoSendMoney"));
        assert!(!text.contains("Arguments"));
    }

    #[test]
    fn medium_detail_lists_arguments_and_returns() {
        let text = sample_tool().describe(DetailLevel::Medium);
        assert!(text.contains("Arguments:"));
        assert!(text.contains("recipient_username (string, required)"));
        assert!(text.contains("note (string, optional)"));
        assert!(text.contains("Returns:"));
        assert!(text.contains("success (boolean, required)"));
        assert!(!text.contains("Exceptions"));
    }

    #[test]
    fn high_detail_adds_exceptions() {
        let text = sample_tool().describe(DetailLevel::High);
        assert!(text.contains("Exceptions: InvalidRequestException, NotFoundException"));
    }

    #[test]
    fn toolkit_describe_includes_every_tool() {
        let mut kit = Toolkit::new("Venmo", "Peer-to-peer payments.");
        kit.tools.push(sample_tool());
        let text = kit.describe(DetailLevel::Low);
        assert!(text.contains("<Venmo> toolkit"));
        assert!(text.contains("VenmoSendMoney"));
    }

    #[test]
    fn toolkit_tool_lookup() {
        let mut kit = Toolkit::new("Venmo", "Payments.");
        kit.tools.push(sample_tool());
        assert!(kit.tool("VenmoSendMoney").is_some());
        assert!(kit.tool("VenmoDeleteAccount").is_none());
    }
}
