// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! JSON extraction and repair for model output.
//!
//! Models asked for "a single JSON object" routinely wrap it in markdown
//! fences, prepend prose, or emit invalid escape sequences.  This module
//! recovers the object without another model round-trip wherever possible.

use serde_json::Value;

/// Extract and parse the first JSON object found in `text`.
///
/// Tries, in order:
/// 1. the whole trimmed text,
/// 2. the content of a ```json fenced block,
/// 3. the substring from the first `{` to the last `}`,
/// each both verbatim and with invalid escape sequences repaired.
pub fn extract_json_object(text: &str) -> anyhow::Result<Value> {
    let candidates = candidate_slices(text);
    for candidate in &candidates {
        if let Ok(v) = serde_json::from_str::<Value>(candidate) {
            if v.is_object() {
                return Ok(v);
            }
        }
        let fixed = fix_invalid_json_escapes(candidate);
        if let Ok(v) = serde_json::from_str::<Value>(&fixed) {
            if v.is_object() {
                return Ok(v);
            }
        }
    }
    anyhow::bail!("no parseable JSON object in model output")
}

fn candidate_slices(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let mut out = vec![trimmed.to_string()];
    if let Some(fenced) = strip_code_fence(trimmed) {
        out.push(fenced.to_string());
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            out.push(trimmed[start..=end].to_string());
        }
    }
    out
}

/// Return the inner content when the entire text is one fenced code block.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim)
}

/// Walk through a JSON string and replace any invalid escape sequences inside
/// string values with a properly escaped backslash.
///
/// Valid JSON escape characters are: `"`, `\`, `/`, `b`, `f`, `n`, `r`, `t`, `u`.
/// Anything else (e.g. `\c`, `\p`, `\(`) is turned into `\\X` so the
/// resulting JSON round-trips through serde_json without a parse error.
pub fn fix_invalid_json_escapes(json_str: &str) -> String {
    let mut result = String::with_capacity(json_str.len() + 16);
    let mut chars = json_str.chars();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => match chars.next() {
                    Some(next)
                        if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') =>
                    {
                        result.push('\\');
                        result.push(next);
                    }
                    Some(next) => {
                        result.push('\\');
                        result.push('\\');
                        result.push(next);
                    }
                    None => result.push('\\'),
                },
                '"' => {
                    in_string = false;
                    result.push('"');
                }
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }
    result
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
