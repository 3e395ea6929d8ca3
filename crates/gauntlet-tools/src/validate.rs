// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Schema checking for tool inputs and simulated outputs.
//!
//! The checks are deliberately small: type tags, required fields, nested
//! objects and array items — the subset the tool catalogue actually uses.
//! Input validation additionally rejects uninstantiated placeholders, which
//! is how an agent handing over `"<user>"` or `"[ACCOUNT_NUMBER]"` is caught
//! before any simulation happens.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Why a value failed validation.  `Display` strings are surfaced verbatim
/// inside `InvalidRequestException:` error observations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("tool input must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("wrong type for '{field}': expected {expected}")]
    WrongType { field: String, expected: String },
    #[error("placeholder in {0}")]
    Placeholder(String),
}

fn bracket_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[A-Z0-9_]+\]$").unwrap())
}

/// True when a string is an uninstantiated placeholder rather than a value:
/// wholly angle-bracketed (`<user>`), an upper-case bracket token
/// (`[ACCOUNT_NUMBER]`), or a literal not-available marker.
pub fn is_placeholder(s: &str) -> bool {
    let t = s.trim();
    if t.len() >= 2 && t.starts_with('<') && t.ends_with('>') {
        return true;
    }
    if bracket_token_re().is_match(t) {
        return true;
    }
    matches!(t.to_ascii_lowercase().as_str(), "n/a" | "none" | "null" | "...")
}

/// Check `value` against an object `schema`: required fields present, field
/// types matching the schema's type tags, recursively through nested objects
/// and array items.  Fields not named by the schema are ignored.
pub fn check_against_schema(schema: &Value, value: &Value) -> Result<(), InputError> {
    check_object(schema, value, "")
}

fn check_object(schema: &Value, value: &Value, path: &str) -> Result<(), InputError> {
    let Some(object) = value.as_object() else {
        return Err(InputError::NotAnObject);
    };

    if let Some(required) = schema["required"].as_array() {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                return Err(InputError::MissingField(join_path(path, field)));
            }
        }
    }

    if let Some(props) = schema["properties"].as_object() {
        for (field, field_schema) in props {
            if let Some(field_value) = object.get(field) {
                check_field(field_schema, field_value, &join_path(path, field))?;
            }
        }
    }
    Ok(())
}

fn check_field(schema: &Value, value: &Value, path: &str) -> Result<(), InputError> {
    let Some(expected) = schema["type"].as_str() else {
        return Ok(());
    };
    let ok = match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    };
    if !ok {
        // Null satisfies optional fields: the schema's `required` list is the
        // presence authority, a null just means "not provided".
        if value.is_null() {
            return Ok(());
        }
        return Err(InputError::WrongType { field: path.to_string(), expected: expected.into() });
    }
    match expected {
        "object" => check_object(schema, value, path)?,
        "array" => {
            if let (Some(item_schema), Some(items)) = (schema.get("items"), value.as_array()) {
                for item in items {
                    check_field(item_schema, item, path)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validate a tool call's input object against the tool's input schema.
///
/// Schema checking per [`check_against_schema`], plus a recursive placeholder
/// scan over every string in the input.  The first failure wins.
pub fn validate_inputs(input_schema: &Value, tool_input: &Value) -> Result<(), InputError> {
    check_against_schema(input_schema, tool_input)?;
    scan_placeholders(tool_input, "")
}

fn scan_placeholders(value: &Value, path: &str) -> Result<(), InputError> {
    match value {
        Value::String(s) if is_placeholder(s) => {
            Err(InputError::Placeholder(if path.is_empty() {
                "input".to_string()
            } else {
                path.to_string()
            }))
        }
        Value::Object(map) => {
            for (field, v) in map {
                scan_placeholders(v, &join_path(path, field))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                scan_placeholders(item, path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn join_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
