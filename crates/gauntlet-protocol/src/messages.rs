// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The transcript message model.
//!
//! One tagged enum covers every message kind that can land in an episode's
//! inbox.  Each variant renders to the natural-language form that agents and
//! evaluators see in their interaction history.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The kind of action an agent can take on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    None,
    Speak,
    NonVerbal,
    Leave,
    /// A tool call; the action argument decodes as a [`ToolCall`].
    Action,
}

impl ActionKind {
    /// The identifier agents are shown in their available-action lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::None => "none",
            ActionKind::Speak => "speak",
            ActionKind::NonVerbal => "non_verbal",
            ActionKind::Leave => "leave",
            ActionKind::Action => "action",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action emitted by one agent on one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    #[serde(rename = "action_type")]
    pub kind: ActionKind,
    /// The utterance for `speak`, the gesture for `non_verbal`, or the
    /// JSON-encoded tool call for `action`.
    #[serde(default)]
    pub argument: String,
}

impl AgentAction {
    pub fn none() -> Self {
        Self { kind: ActionKind::None, argument: String::new() }
    }

    pub fn speak(utterance: impl Into<String>) -> Self {
        Self { kind: ActionKind::Speak, argument: utterance.into() }
    }

    pub fn leave() -> Self {
        Self { kind: ActionKind::Leave, argument: String::new() }
    }

    pub fn tool_call(call: &ToolCall) -> Self {
        Self {
            kind: ActionKind::Action,
            argument: serde_json::to_string(call).unwrap_or_default(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == ActionKind::None
    }

    pub fn to_natural_language(&self) -> String {
        match self.kind {
            ActionKind::None => "did nothing".to_string(),
            ActionKind::Speak => format!("said: \"{}\"", self.argument),
            ActionKind::NonVerbal => format!("[non-verbal communication] {}", self.argument),
            ActionKind::Action => format!("[action] {}", self.argument),
            ActionKind::Leave => "left the conversation".to_string(),
        }
    }

    /// JSON schema for LLM-generated actions.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "action_type": {
                    "type": "string",
                    "enum": ["none", "speak", "non_verbal", "leave", "action"],
                    "description": "the type of action to take"
                },
                "argument": {
                    "type": "string",
                    "description": "the utterance if you choose 'speak' (a plain string, \
                                    not JSON), the expression or gesture if you choose \
                                    'non_verbal', or the JSON-encoded tool call if you \
                                    choose 'action'"
                }
            },
            "required": ["action_type", "argument"]
        })
    }
}

/// A tool invocation decoded from an `action`-kind [`AgentAction`] argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The name of the tool to execute.
    pub tool: String,
    /// The input to pass to the tool — a single JSON object.
    pub tool_input: Value,
    /// The agent's stated reason for the call; kept for auditing only.
    #[serde(default)]
    pub log: String,
}

impl ToolCall {
    /// Decode a tool call from an action argument.
    pub fn decode(argument: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(argument)
    }

    /// JSON schema for LLM-repaired tool calls.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool": {"type": "string", "description": "the name of the tool to execute"},
                "tool_input": {"type": "object", "description": "the input to pass to the tool"},
                "log": {"type": "string", "description": "why this call is being made"}
            },
            "required": ["tool", "tool_input"]
        })
    }
}

/// The simulated result of a tool call, produced by the grounding layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedObservation {
    /// The simulated tool output: a single JSON object matching the tool's
    /// return specification, or `{"error": …}`.
    #[serde(default)]
    pub observation: String,
    /// Summary of the simulator's reasoning.  Log data only.
    #[serde(default)]
    pub thought_summary: String,
    /// The simulator's step-by-step reasoning.  Log data only.
    #[serde(default)]
    pub log: String,
}

impl SimulatedObservation {
    pub fn new(observation: impl Into<String>) -> Self {
        Self { observation: observation.into(), ..Default::default() }
    }

    /// An error-shaped observation (`{"error": "<message>"}`).
    pub fn error(message: &str) -> Self {
        Self::new(json!({"error": message}).to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.observation.is_empty()
    }

    pub fn to_natural_language(&self) -> String {
        format!("Observation: \n{}", self.observation)
    }

    /// JSON schema for LLM-generated observations.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "log": {
                    "type": "string",
                    "description": "the simulator's step-by-step thought process for \
                                    simulating an accurate and realistic observation"
                },
                "thought_summary": {
                    "type": "string",
                    "description": "a clear and concise summary of the simulator thought"
                },
                "observation": {
                    "type": "string",
                    "description": "the simulated tool output: a JSON string with fields \
                                    matching the tool's return specification"
                }
            },
            "required": ["log", "thought_summary", "observation"]
        })
    }
}

/// What one agent is shown at the start of its turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Natural-language rendering of what happened last turn, already
    /// filtered for this viewer.
    pub last_turn: String,
    pub turn_number: usize,
    /// The action kinds this agent may use this turn.  Exactly `[none]`
    /// when the agent is masked out.
    pub available_actions: Vec<ActionKind>,
}

impl Observation {
    pub fn to_natural_language(&self) -> String {
        self.last_turn.clone()
    }

    /// True when the only available action is `none`.
    pub fn none_only(&self) -> bool {
        self.available_actions == [ActionKind::None]
    }
}

/// Any message that can appear in the episode transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Simple { message: String },
    Obs(Observation),
    Action(AgentAction),
    Simulated(SimulatedObservation),
}

impl Message {
    pub fn simple(message: impl Into<String>) -> Self {
        Message::Simple { message: message.into() }
    }

    /// The `Turn #k` delimiter the engine appends at the top of every turn.
    pub fn turn_delimiter(turn_number: usize) -> Self {
        Message::simple(format!("Turn #{turn_number}"))
    }

    /// Parse a turn delimiter back into its turn number.
    pub fn as_turn_delimiter(&self) -> Option<usize> {
        match self {
            Message::Simple { message } => {
                message.strip_prefix("Turn #").and_then(|n| n.parse().ok())
            }
            _ => None,
        }
    }

    pub fn to_natural_language(&self) -> String {
        match self {
            Message::Simple { message } => message.clone(),
            Message::Obs(obs) => obs.to_natural_language(),
            Message::Action(action) => action.to_natural_language(),
            Message::Simulated(obs) => obs.to_natural_language(),
        }
    }
}

/// One transcript entry: who sent it, and what it was.  The sender is the
/// agent's display name, or `"Environment"` for engine-emitted messages.
pub type InboxEntry = (String, Message);

/// Sender name used for engine-emitted messages.
pub const ENVIRONMENT: &str = "Environment";

// ─── Unit tests ──────────────────────────────────────────────────────────────
