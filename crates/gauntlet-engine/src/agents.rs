// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The two agent adapters.
//!
//! Both agents accumulate the observations they are shown and prompt their
//! model with the rendered history.  The human agent is restricted to
//! conversational action kinds; the AI agent may additionally emit tool
//! calls, which are round-tripped through one LLM reformat when malformed.

use std::sync::Arc;

use async_trait::async_trait;

use gauntlet_model::{GenerateOptions, ModelProvider};
use gauntlet_protocol::{ActionKind, AgentAction, AgentProfile, Observation};

use crate::generate::{generate_agent_action, repair_tool_call};
use crate::prompts::{AI_ACTION_TEMPLATE, HUMAN_ACTION_TEMPLATE};

/// Action kinds a human participant can take.  Tool calls are never one.
pub const HUMAN_ACTION_KINDS: &[ActionKind] =
    &[ActionKind::None, ActionKind::Speak, ActionKind::NonVerbal, ActionKind::Leave];

/// A participant in an episode.
#[async_trait]
pub trait Agent: Send {
    fn profile(&self) -> &AgentProfile;
    fn model_name(&self) -> String;
    fn set_goal(&mut self, goal: String);
    /// Receive an observation and produce this turn's action.
    async fn act(&mut self, observation: &Observation) -> AgentAction;

    fn name(&self) -> String {
        self.profile().name()
    }
}

/// Simulates the human participant.
pub struct HumanAgent {
    pub profile: AgentProfile,
    goal: String,
    model: Arc<dyn ModelProvider>,
    opts: GenerateOptions,
    inbox: Vec<String>,
}

impl HumanAgent {
    pub fn new(profile: AgentProfile, model: Arc<dyn ModelProvider>, opts: GenerateOptions) -> Self {
        Self { profile, goal: String::new(), model, opts, inbox: Vec::new() }
    }

    fn history(&self) -> String {
        self.inbox.join("\n")
    }
}

#[async_trait]
impl Agent for HumanAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn model_name(&self) -> String {
        self.model.model_name().to_string()
    }

    fn set_goal(&mut self, goal: String) {
        self.goal = goal;
    }

    async fn act(&mut self, observation: &Observation) -> AgentAction {
        if !observation.last_turn.is_empty() {
            self.inbox.push(observation.last_turn.clone());
        }
        if observation.none_only() {
            return AgentAction::none();
        }
        // The engine's available list may be wider than a human can use;
        // the human register never includes tool calls.
        let kinds: Vec<ActionKind> = observation
            .available_actions
            .iter()
            .copied()
            .filter(|kind| HUMAN_ACTION_KINDS.contains(kind))
            .collect();
        generate_agent_action(
            self.model.as_ref(),
            HUMAN_ACTION_TEMPLATE,
            &self.name(),
            &self.goal,
            &self.history(),
            observation.turn_number,
            &kinds,
            &self.opts,
        )
        .await
    }
}

/// Simulates the AI assistant participant.
pub struct AiAgent {
    pub profile: AgentProfile,
    goal: String,
    model: Arc<dyn ModelProvider>,
    opts: GenerateOptions,
    inbox: Vec<String>,
}

impl AiAgent {
    pub fn new(profile: AgentProfile, model: Arc<dyn ModelProvider>, opts: GenerateOptions) -> Self {
        Self { profile, goal: String::new(), model, opts, inbox: Vec::new() }
    }

    fn history(&self) -> String {
        self.inbox.join("\n")
    }
}

#[async_trait]
impl Agent for AiAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn model_name(&self) -> String {
        self.model.model_name().to_string()
    }

    fn set_goal(&mut self, goal: String) {
        self.goal = goal;
    }

    async fn act(&mut self, observation: &Observation) -> AgentAction {
        if !observation.last_turn.is_empty() {
            self.inbox.push(observation.last_turn.clone());
        }
        if observation.none_only() {
            return AgentAction::none();
        }
        let action = generate_agent_action(
            self.model.as_ref(),
            AI_ACTION_TEMPLATE,
            &self.name(),
            &self.goal,
            &self.history(),
            observation.turn_number,
            &observation.available_actions,
            &self.opts,
        )
        .await;
        if action.kind == ActionKind::Action {
            return repair_tool_call(self.model.as_ref(), action, &self.opts).await;
        }
        action
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
