// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Engine-side LLM helpers.
//!
//! These wrap [`gauntlet_model::generate`] with the engine's degraded-mode
//! policy: agent generation failures become `none` actions, simulator
//! failures become error observations, and observation repair is attempted
//! exactly once.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use gauntlet_model::{generate, generate_value, GenerateOptions, ModelProvider};
use gauntlet_protocol::{ActionKind, AgentAction, SimulatedObservation, ToolCall};
use gauntlet_tools::{check_against_schema, ToolSpec};

use crate::prompts::{ACTION_CRITIQUE, SIMULATOR_CRITIQUE, SIMULATOR_PROMPT};

fn vars(pairs: Vec<(&str, String)>) -> HashMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Generate one agent action.  Any failure degrades to `none`.
#[allow(clippy::too_many_arguments)]
pub async fn generate_agent_action(
    model: &dyn ModelProvider,
    template: &str,
    agent: &str,
    goal: &str,
    history: &str,
    turn_number: usize,
    action_types: &[ActionKind],
    opts: &GenerateOptions,
) -> AgentAction {
    let action_list =
        action_types.iter().map(ActionKind::as_str).collect::<Vec<_>>().join(" ");
    let vars = vars(vec![
        ("agent", agent.to_string()),
        ("goal", goal.to_string()),
        ("history", history.to_string()),
        ("turn_number", turn_number.to_string()),
        ("action_list", action_list),
    ]);
    match generate::<AgentAction>(model, template, &vars, &AgentAction::schema(), opts).await {
        Ok(action) if action_types.contains(&action.kind) => action,
        Ok(action) => {
            warn!(agent, kind = %action.kind, "agent chose an unavailable action; dropping");
            AgentAction::none()
        }
        Err(e) => {
            warn!(agent, error = %e, "agent action generation failed");
            AgentAction::none()
        }
    }
}

/// Generate a simulated observation for one validated tool call.
///
/// The prompt steers the simulator toward the scenario's risky outcome while
/// holding realism above adversarial shaping.  On failure the grounding
/// layer still gets an error-shaped observation rather than an `Err`.
pub async fn generate_simulated_observation(
    model: &dyn ModelProvider,
    history: &str,
    tool: &ToolSpec,
    toolkit_description: &str,
    guide: &str,
    opts: &GenerateOptions,
) -> SimulatedObservation {
    let vars = vars(vec![
        ("current_tool", tool.name.clone()),
        ("current_tool_description", tool.description.clone()),
        ("toolkit_descriptions", toolkit_description.to_string()),
        ("interaction_history", history.to_string()),
        ("guide", if guide.is_empty() { "(none)".to_string() } else { guide.to_string() }),
    ]);
    match generate::<SimulatedObservation>(
        model,
        SIMULATOR_PROMPT,
        &vars,
        &SimulatedObservation::schema(),
        opts,
    )
    .await
    {
        Ok(observation) => observation,
        Err(e) => {
            warn!(tool = %tool.name, error = %e, "observation generation failed");
            SimulatedObservation::error(&format!("engine failed: {e}"))
        }
    }
}

/// Validate an observation against the tool's output schema, repairing once.
///
/// Returns `(was_valid, corrected)`: `was_valid` is true when the original
/// observation passed as-is, and `corrected` is the observation string the
/// engine should use either way.  Error-shaped observations are accepted
/// verbatim.  Exactly one repair call is made; a second failure degrades to
/// an error observation.
pub async fn validate_observation(
    model: &dyn ModelProvider,
    observation: &SimulatedObservation,
    output_schema: Option<&Value>,
    opts: &GenerateOptions,
) -> (bool, String) {
    if observation_is_valid(&observation.observation, output_schema) {
        return (true, observation.observation.clone());
    }

    let vars = vars(vec![
        ("log", observation.log.clone()),
        ("thought_summary", observation.thought_summary.clone()),
        ("observation", observation.observation.clone()),
    ]);
    let schema = output_schema
        .cloned()
        .unwrap_or_else(|| serde_json::json!({"type": "object"}));
    match generate_value(model, SIMULATOR_CRITIQUE, &vars, &schema, opts).await {
        Ok(repaired) => {
            let repaired_str = repaired.to_string();
            if observation_is_valid(&repaired_str, output_schema) {
                (false, repaired_str)
            } else {
                (
                    false,
                    SimulatedObservation::error("schema repair produced an invalid observation")
                        .observation,
                )
            }
        }
        Err(e) => {
            warn!(error = %e, "observation repair failed");
            (false, SimulatedObservation::error(&format!("schema repair failed: {e}")).observation)
        }
    }
}

/// An observation is valid when it parses as a JSON object and either carries
/// a top-level `error` field or conforms to the tool's output schema.
fn observation_is_valid(observation: &str, output_schema: Option<&Value>) -> bool {
    let Ok(parsed) = serde_json::from_str::<Value>(observation) else {
        return false;
    };
    if !parsed.is_object() {
        return false;
    }
    if parsed.get("error").is_some() {
        return true;
    }
    match output_schema {
        Some(schema) => check_against_schema(schema, &parsed).is_ok(),
        None => true,
    }
}

/// Round-trip repair for a malformed tool-call argument.
///
/// When the argument already decodes as a [`ToolCall`] the action is returned
/// unchanged; otherwise one LLM reformat is attempted, and on failure the
/// original action is kept (the grounding engine will reject it with an
/// error observation the agent can react to).
pub async fn repair_tool_call(
    model: &dyn ModelProvider,
    action: AgentAction,
    opts: &GenerateOptions,
) -> AgentAction {
    if action.kind != ActionKind::Action || ToolCall::decode(&action.argument).is_ok() {
        return action;
    }
    let vars = vars(vec![
        ("action_type", action.kind.to_string()),
        ("action_argument", action.argument.clone()),
    ]);
    match generate_value(model, ACTION_CRITIQUE, &vars, &ToolCall::schema(), opts).await {
        Ok(repaired) if serde_json::from_value::<ToolCall>(repaired.clone()).is_ok() => {
            AgentAction { kind: ActionKind::Action, argument: repaired.to_string() }
        }
        Ok(_) | Err(_) => {
            warn!("tool call repair failed; keeping the original argument");
            action
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
