// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! OpenAI-compatible chat completion driver.
//!
//! Most hosted and local model servers speak the same `/chat/completions`
//! wire format.  This driver issues one non-streaming POST per completion
//! and replays the full reply through the [`ResponseStream`] interface so
//! callers are agnostic to the transport.
//!
//! # Auth styles
//! - `Bearer` — `Authorization: Bearer <key>` (hosted providers)
//! - `None` — no authentication (local servers like Ollama / llama.cpp)

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};
use tracing::debug;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent};

/// How to send the API key in HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` — standard for most providers.
    Bearer,
    /// No authentication header — local servers (Ollama, vLLM, llama.cpp).
    None,
}

/// OpenAI-compatible chat completion provider.
pub struct OpenAiCompatProvider {
    /// Provider id returned by `ModelProvider::name()`.
    driver_name: &'static str,
    /// Model id forwarded to the API.
    model: String,
    /// API key (pre-resolved from config or env).
    api_key: Option<String>,
    /// Full chat completions URL, e.g. `https://api.openai.com/v1/chat/completions`.
    chat_url: String,
    max_tokens: u32,
    client: reqwest::Client,
    auth_style: AuthStyle,
}

impl OpenAiCompatProvider {
    /// Construct a provider from its endpoint base URL and auth configuration.
    ///
    /// `base_url` ends **before** `/chat/completions`, e.g.
    /// `https://api.openai.com/v1`.
    pub fn new(
        driver_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: &str,
        max_tokens: Option<u32>,
        auth_style: AuthStyle,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            driver_name,
            model,
            api_key,
            chat_url: format!("{base}/chat/completions"),
            max_tokens: max_tokens.unwrap_or(4096),
            client: reqwest::Client::new(),
            auth_style,
        }
    }
}

#[async_trait]
impl crate::ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.driver_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let messages: Vec<Value> = req
            .messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": req.max_tokens.unwrap_or(self.max_tokens),
            "temperature": req.temperature.unwrap_or(0.7),
            "stream": false,
        });

        debug!(url = %self.chat_url, model = %self.model, "chat completion request");

        let mut http = self.client.post(&self.chat_url).json(&body);
        if self.auth_style == AuthStyle::Bearer {
            match &self.api_key {
                Some(key) => http = http.bearer_auth(key),
                None => bail!("{} requires an API key", self.driver_name),
            }
        }

        let resp = http.send().await.context("chat completion request failed")?;
        let status = resp.status();
        let payload: Value = resp.json().await.context("chat completion body was not JSON")?;

        if !status.is_success() {
            bail!("{} error {status}: {payload}", self.driver_name);
        }

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            bail!("{} returned an empty completion: {payload}", self.driver_name);
        }

        let input_tokens = payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32;
        let output_tokens = payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32;

        let events: Vec<anyhow::Result<ResponseEvent>> = vec![
            Ok(ResponseEvent::TextDelta(text)),
            Ok(ResponseEvent::Usage { input_tokens, output_tokens }),
            Ok(ResponseEvent::Done),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
