// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The episode log: the append-only record emitted when an episode ends.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A terminal rating for one agent: the overall score plus the per-dimension
/// breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReward {
    pub overall: f64,
    pub dimensions: BTreeMap<String, f64>,
}

impl AgentReward {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// The full record of one finished episode.
///
/// `messages` is grouped by turn; each entry is `(sender, receiver, text)`.
/// The log is constructed once at episode end and never mutated.
///
/// `id` and `created_at` are per-emission metadata stamped at construction;
/// everything else is a pure function of the episode's inbox, reasoning, and
/// rewards.  Re-emission from identical inputs therefore yields identical
/// [`EpisodeLog::content`], and serializing one log twice is byte-stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeLog {
    /// Unique emission id.  Not part of the content equality contract.
    pub id: String,
    /// Scenario codename.
    pub environment: String,
    /// Participant display names, human role first.
    pub agents: Vec<String>,
    /// Opaque grouping tag supplied by the caller (e.g. a benchmark tag).
    pub tag: Option<String>,
    /// Model identifiers: engine model first, then one per agent.
    pub models: Vec<String>,
    pub messages: Vec<Vec<(String, String, String)>>,
    /// The terminal evaluators' concatenated reasoning.
    pub reasoning: String,
    pub rewards: Vec<AgentReward>,
    /// The prompt the terminal evaluator scored with, for auditability.
    pub rewards_prompt: String,
    /// Emission timestamp.  Not part of the content equality contract.
    pub created_at: DateTime<Utc>,
}

impl EpisodeLog {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            environment: environment.into(),
            agents: Vec::new(),
            tag: None,
            models: Vec::new(),
            messages: Vec::new(),
            reasoning: String::new(),
            rewards: Vec::new(),
            rewards_prompt: String::new(),
            created_at: Utc::now(),
        }
    }

    /// The log's deterministic content: the serialized form minus the
    /// per-emission `id` and `created_at` stamps.
    ///
    /// Two logs built from the same inbox, reasoning, and rewards compare
    /// equal here even though each emission carries its own identifier.
    pub fn content(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
            map.remove("created_at");
        }
        value
    }
}

/// The classification of one rendered transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderedKind {
    Info,
    Divider,
    Said,
    Action,
    Observation,
    Leave,
    Environment,
    Comment,
}

/// One line of the human-readable episode rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub role: String,
    pub kind: RenderedKind,
    pub content: String,
}

impl RenderedMessage {
    fn new(role: impl Into<String>, kind: RenderedKind, content: impl Into<String>) -> Self {
        Self { role: role.into(), kind, content: content.into() }
    }
}

/// Generate a human-readable rendering of an episode log.
///
/// Turn 0 carries the background blocks each agent was shown; later turns
/// are classified into speech, actions, observations, and leaves.  Inactive
/// (`did nothing`) lines are dropped.
pub fn render_for_humans(episode: &EpisodeLog) -> Vec<RenderedMessage> {
    let mut out: Vec<RenderedMessage> = Vec::new();

    for (idx, turn) in episode.messages.iter().enumerate() {
        if idx == 0 {
            for (_, receiver, text) in turn {
                out.push(RenderedMessage::new(
                    format!("Background ({receiver})"),
                    RenderedKind::Info,
                    text.clone(),
                ));
            }
            out.push(RenderedMessage::new("System", RenderedKind::Divider, "Start Simulation"));
            continue;
        }

        let mut observation_printed = false;
        for (sender, receiver, text) in turn {
            if !observation_printed && text.contains("Observation:") {
                let extracted = text.split("Observation:").nth(1).unwrap_or("").trim();
                if !extracted.is_empty() {
                    out.push(RenderedMessage::new(
                        "Observation",
                        RenderedKind::Observation,
                        extracted,
                    ));
                }
                observation_printed = true;
            }

            if receiver != "Environment" {
                continue;
            }
            if sender == "Environment" {
                out.push(RenderedMessage::new(
                    "Environment",
                    RenderedKind::Environment,
                    text.clone(),
                ));
            } else if text.contains("did nothing") {
                continue;
            } else if text.contains("left the conversation") {
                out.push(RenderedMessage::new(
                    "Environment",
                    RenderedKind::Leave,
                    format!("{sender} left the conversation"),
                ));
            } else if let Some(utterance) = text.split("said:").nth(1) {
                out.push(RenderedMessage::new(sender, RenderedKind::Said, utterance.trim()));
            } else {
                out.push(RenderedMessage::new(
                    sender,
                    RenderedKind::Action,
                    text.replace("[action]", "").trim(),
                ));
            }
        }
    }

    out.push(RenderedMessage::new("System", RenderedKind::Divider, "End Simulation"));

    if !episode.reasoning.is_empty() {
        out.push(RenderedMessage::new("General", RenderedKind::Comment, &episode.reasoning));
    }
    for (idx, reward) in episode.rewards.iter().enumerate() {
        out.push(RenderedMessage::new(
            format!("Agent {}", idx + 1),
            RenderedKind::Comment,
            format!("Overall: {:.1}; scores: {:?}", reward.overall, reward.dimensions),
        ));
    }

    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
