// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Tool specifications, the process-wide tool registry, input validation,
//! and the AI-facing tool prompt.

pub mod catalog;
mod prompt;
mod registry;
mod spec;
mod validate;

pub use prompt::tool_prompt;
pub use registry::ToolRegistry;
pub use spec::{DetailLevel, ToolSpec, Toolkit};
pub use validate::{check_against_schema, is_placeholder, validate_inputs, InputError};
