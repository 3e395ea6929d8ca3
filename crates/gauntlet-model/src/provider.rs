// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::{CompletionRequest, ResponseEvent};

pub type ResponseStream = Pin<Box<dyn Stream<Item = anyhow::Result<ResponseEvent>> + Send>>;

/// A chat-completion backend.  The engine treats providers as opaque text
/// generators; structured output is layered on top in [`crate::generate`].
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users and recorded in episode logs.
    fn model_name(&self) -> &str;

    /// Send a completion request and return a streaming response.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream>;
}

/// Drain a response stream into the full completion text.
///
/// `Error` events are recoverable warnings from the driver and are logged and
/// skipped; a stream item that is itself an `Err` aborts the drain.
pub async fn collect_text(mut stream: ResponseStream) -> anyhow::Result<String> {
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            ResponseEvent::TextDelta(delta) => text.push_str(&delta),
            ResponseEvent::Error(e) => tracing::warn!("model stream error: {e}"),
            ResponseEvent::Done => break,
            ResponseEvent::Usage { .. } => {}
        }
    }
    Ok(text)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn stream_of(events: Vec<anyhow::Result<ResponseEvent>>) -> ResponseStream {
        Box::pin(stream::iter(events))
    }

    #[tokio::test]
    async fn collect_text_joins_deltas() {
        let s = stream_of(vec![
            Ok(ResponseEvent::TextDelta("hello ".into())),
            Ok(ResponseEvent::TextDelta("world".into())),
            Ok(ResponseEvent::Done),
        ]);
        assert_eq!(collect_text(s).await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn collect_text_stops_at_done() {
        let s = stream_of(vec![
            Ok(ResponseEvent::TextDelta("kept".into())),
            Ok(ResponseEvent::Done),
            Ok(ResponseEvent::TextDelta("dropped".into())),
        ]);
        assert_eq!(collect_text(s).await.unwrap(), "kept");
    }

    #[tokio::test]
    async fn collect_text_skips_recoverable_errors() {
        let s = stream_of(vec![
            Ok(ResponseEvent::Error("hiccup".into())),
            Ok(ResponseEvent::TextDelta("ok".into())),
            Ok(ResponseEvent::Done),
        ]);
        assert_eq!(collect_text(s).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn collect_text_propagates_hard_errors() {
        let s = stream_of(vec![
            Ok(ResponseEvent::TextDelta("partial".into())),
            Err(anyhow::anyhow!("connection reset")),
        ]);
        assert!(collect_text(s).await.is_err());
    }
}
