// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent};

/// Deterministic mock provider for tests.  Echoes the last user message
/// back as the assistant response.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::Role::User))
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "[no input]".to_string());

        let events: Vec<anyhow::Result<ResponseEvent>> = vec![
            Ok(ResponseEvent::TextDelta(format!("MOCK: {reply}"))),
            Ok(ResponseEvent::Usage { input_tokens: 10, output_tokens: 10 }),
            Ok(ResponseEvent::Done),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

/// A pre-scripted mock provider.  Each call to `complete` pops the next
/// response script from the front of the queue; when the queue is empty the
/// fallback script is replayed.  This lets tests specify exact event
/// sequences without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<Vec<ResponseEvent>>>>,
    /// Replayed once the queue is exhausted.  Defaults to a
    /// `[no more scripts]` text reply.
    fallback: Vec<ResponseEvent>,
    name: String,
    /// The last `CompletionRequest` seen by this provider.
    /// Written on each `complete()` call so tests can inspect what was sent.
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedMockProvider {
    /// Build a provider from a list of response scripts.
    /// The outer `Vec` is the ordered list of calls; the inner `Vec` is the
    /// sequence of [`ResponseEvent`]s emitted for that call.
    pub fn new(scripts: Vec<Vec<ResponseEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            fallback: text_script("[no more scripts]".into()),
            name: "scripted-mock".into(),
            last_request: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Convenience: provider that always returns the same text reply,
    /// regardless of how many times it is called.
    pub fn always_text(reply: impl Into<String>) -> Self {
        let mut p = Self::new(vec![]);
        p.fallback = text_script(reply.into());
        p
    }

    /// Convenience: provider that emits the given text replies in order and
    /// then falls back to `[no more scripts]`.
    pub fn from_texts(replies: Vec<String>) -> Self {
        Self::new(replies.into_iter().map(text_script).collect())
    }

    /// Replace the exhausted-queue fallback script.
    pub fn with_fallback_text(mut self, reply: impl Into<String>) -> Self {
        self.fallback = text_script(reply.into());
        self
    }

    /// Number of completion calls served so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

fn text_script(reply: String) -> Vec<ResponseEvent> {
    vec![
        ResponseEvent::TextDelta(reply),
        ResponseEvent::Usage { input_tokens: 5, output_tokens: 5 },
        ResponseEvent::Done,
    ]
}

#[async_trait]
impl crate::ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        &self.name
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        *self.last_request.lock().unwrap() = Some(req);
        *self.calls.lock().unwrap() += 1;
        let events = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                self.fallback.clone()
            } else {
                scripts.remove(0)
            }
        };
        let wrapped: Vec<anyhow::Result<ResponseEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(wrapped)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
