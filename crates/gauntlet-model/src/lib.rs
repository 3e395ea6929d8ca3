// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! LLM client layer: provider trait, drivers, and structured generation.

mod generate;
mod mock;
mod openai_compat;
pub mod parse;
mod provider;
mod types;

pub use generate::{
    apply_template, format_instructions, generate, generate_text, generate_value, GenerateOptions,
};
pub use mock::{MockProvider, ScriptedMockProvider};
pub use openai_compat::{AuthStyle, OpenAiCompatProvider};
pub use provider::{collect_text, ModelProvider, ResponseStream};
pub use types::{ChatMessage, CompletionRequest, ResponseEvent, Role};
