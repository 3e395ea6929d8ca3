// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The grounding engine: turns the AI agent's tool calls into simulated
//! observations.
//!
//! Per turn: find the newest tool call in the current turn window, validate
//! its inputs against the tool's schema, ask the simulator LLM for an
//! observation, and validate/repair the result.  Every failure path produces
//! an error-shaped observation — the episode always continues.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use gauntlet_model::{GenerateOptions, ModelProvider};
use gauntlet_protocol::{ActionKind, InboxEntry, Message, SimulatedObservation, ToolCall};
use gauntlet_tools::{validate_inputs, DetailLevel, ToolRegistry};

use crate::evaluators::{Evaluator, EvaluatorOutput};
use crate::generate::{generate_simulated_observation, validate_observation};
use crate::history::{current_turn_window, history_for_environment};

pub struct GroundingEngine {
    model: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    opts: GenerateOptions,
    enabled_toolkits: Vec<String>,
    output_parsers: BTreeMap<String, Value>,
    guide: String,
}

impl GroundingEngine {
    pub fn new(model: Arc<dyn ModelProvider>, registry: Arc<ToolRegistry>, opts: GenerateOptions) -> Self {
        Self {
            model,
            registry,
            opts,
            enabled_toolkits: Vec::new(),
            output_parsers: BTreeMap::new(),
            guide: String::new(),
        }
    }

    pub fn model_name(&self) -> String {
        self.model.model_name().to_string()
    }

    /// Resolve the scenario's toolkits and render the tool prompt block for
    /// the AI agent's scenario view.  Must be called once at episode reset.
    pub fn create_prompt(&mut self, toolkit_names: &[String], guide: &str) -> String {
        self.enabled_toolkits = toolkit_names.to_vec();
        self.output_parsers = self.registry.output_parsers_by_name(toolkit_names);
        self.guide = guide.to_string();
        self.registry.render_prompt(toolkit_names)
    }

    /// True when `tool_name` is reachable through the enabled toolkits.
    fn tool_enabled(&self, tool_name: &str) -> bool {
        self.output_parsers.contains_key(tool_name)
    }

    fn available_tools(&self) -> String {
        self.registry.tool_names_in(&self.enabled_toolkits).join(", ")
    }

    /// Produce this turn's observation, or an empty one when no tool ran.
    pub async fn ground(&self, inbox: &[InboxEntry]) -> SimulatedObservation {
        let window = current_turn_window(inbox);

        // Newest tool call in the window wins; one observation per turn.
        let tool_action = window.iter().rev().find_map(|(_, message)| match message {
            Message::Action(action) if action.kind == ActionKind::Action => Some(action),
            _ => None,
        });
        let Some(action) = tool_action else {
            return SimulatedObservation::default();
        };

        let call = match ToolCall::decode(&action.argument) {
            Ok(call) => call,
            Err(_) => {
                return SimulatedObservation::error(
                    "InvalidRequestException: current action is not allowed",
                );
            }
        };

        if !self.tool_enabled(&call.tool) {
            return SimulatedObservation::error(&format!(
                "InvalidRequestException: tool '{}' not found. Available tools: {}",
                call.tool,
                self.available_tools(),
            ));
        }
        // Enabled implies registered, so the lookup cannot miss here.
        let Some(tool) = self.registry.tool(&call.tool) else {
            return SimulatedObservation::error(&format!(
                "InvalidRequestException: tool '{}' not found. Available tools: {}",
                call.tool,
                self.available_tools(),
            ));
        };

        if let Err(e) = validate_inputs(&tool.input_schema, &call.tool_input) {
            debug!(tool = %call.tool, error = %e, "rejecting tool call input");
            return SimulatedObservation::error(&format!("InvalidRequestException: {e}"));
        }

        let toolkit_description = self
            .registry
            .toolkit_of(&call.tool)
            .map(|kit| kit.describe(DetailLevel::Low))
            .unwrap_or_default();
        let history = history_for_environment(inbox);

        let mut observation = generate_simulated_observation(
            self.model.as_ref(),
            &history,
            tool,
            &toolkit_description,
            &self.guide,
            &self.opts,
        )
        .await;

        let (valid, corrected) = validate_observation(
            self.model.as_ref(),
            &observation,
            self.output_parsers.get(&call.tool),
            &self.opts,
        )
        .await;
        if !valid {
            observation.observation = corrected;
        }
        observation
    }
}

#[async_trait]
impl Evaluator for GroundingEngine {
    async fn evaluate(&self, _turn_number: usize, inbox: &[InboxEntry]) -> Vec<EvaluatorOutput> {
        vec![EvaluatorOutput::Observation(self.ground(inbox).await)]
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
