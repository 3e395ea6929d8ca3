// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Structured generation: template + variables + output schema → parsed value.
//!
//! Every LLM call the engine makes goes through [`generate`]: a prompt
//! template with `{{key}}` placeholders is rendered, format instructions
//! derived from the expected JSON schema are injected, the provider is called
//! under a deadline, and the reply is parsed into the caller's type.  Errors
//! (timeout, transport, non-parseable output) surface as `Err`; callers
//! decide the degraded behaviour.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{collect_text, parse::extract_json_object, CompletionRequest, ModelProvider};

/// Options shared by all structured-generation calls.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub temperature: f32,
    /// Hard deadline for one provider round-trip.
    pub timeout: Duration,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { temperature: 0.7, timeout: Duration::from_secs(120) }
    }
}

impl GenerateOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Substitute `{{key}}` placeholders in `template` using the provided `vars`.
/// Keys are looked up case-sensitively.  Unknown placeholders are left as-is.
pub fn apply_template(template: &str, vars: &HashMap<String, String>) -> String {
    if vars.is_empty() || !template.contains("{{") {
        return template.to_string();
    }

    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Render the `{{format_instructions}}` block for a JSON output schema.
pub fn format_instructions(schema: &Value) -> String {
    format!(
        "Respond with a single JSON object (no markdown fences, no commentary) \
         that conforms to the following JSON schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
    )
}

/// Render a template and call the provider, returning the raw reply text.
pub async fn generate_text(
    provider: &dyn ModelProvider,
    template: &str,
    vars: &HashMap<String, String>,
    opts: &GenerateOptions,
) -> anyhow::Result<String> {
    let prompt = apply_template(template, vars);
    let req = CompletionRequest::from_prompt(prompt).with_temperature(opts.temperature);
    let stream = tokio::time::timeout(opts.timeout, provider.complete(req))
        .await
        .context("model call timed out")??;
    let text = tokio::time::timeout(opts.timeout, collect_text(stream))
        .await
        .context("model stream timed out")??;
    Ok(text)
}

/// Render a template, inject schema-derived format instructions, call the
/// provider, and parse the reply into `T`.
///
/// `{{format_instructions}}` in the template is replaced by the rendered
/// schema instruction; templates without the placeholder get the instruction
/// appended instead so the schema is never silently omitted.
pub async fn generate<T: DeserializeOwned>(
    provider: &dyn ModelProvider,
    template: &str,
    vars: &HashMap<String, String>,
    schema: &Value,
    opts: &GenerateOptions,
) -> anyhow::Result<T> {
    let value = generate_value(provider, template, vars, schema, opts).await?;
    serde_json::from_value(value).context("model output did not match the expected shape")
}

/// Like [`generate`] but stops at the parsed [`Value`], for callers that do
/// their own shape checking.
pub async fn generate_value(
    provider: &dyn ModelProvider,
    template: &str,
    vars: &HashMap<String, String>,
    schema: &Value,
    opts: &GenerateOptions,
) -> anyhow::Result<Value> {
    let mut vars = vars.clone();
    vars.insert("format_instructions".to_string(), format_instructions(schema));

    let mut template = template.to_string();
    if !template.contains("{{format_instructions}}") {
        template.push_str("\n\n{{format_instructions}}");
    }

    let text = generate_text(provider, &template, &vars, opts).await?;
    extract_json_object(&text)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
