// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Merging heterogeneous evaluator outputs into one per-turn response.
//!
//! Scores are partitioned by scope and reduced dimension-wise: booleans AND,
//! numbers sum.  The reduction is order-independent, so the completion order
//! of the concurrently-joined evaluators never changes the result.

use std::collections::BTreeMap;

use thiserror::Error;

use gauntlet_protocol::{AgentReward, SimulatedObservation};

use crate::evaluators::{EvalEntry, EvaluatorOutput, ScoreValue};

/// Violations of the aggregation invariants.  These are programmer errors:
/// the engine terminates the episode abnormally when one surfaces.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("more than one simulated observation in a single turn")]
    MultipleObservations,
    #[error("mixed bool and numeric values for dimension '{0}'")]
    MixedTypes(String),
    #[error("unknown evaluation scope '{0}'")]
    UnknownScope(String),
}

/// The merged result of one turn's evaluators and grounding engine.
#[derive(Debug, Clone, Default)]
pub struct EnvResponse {
    pub terminated: bool,
    pub p1_rate: Option<AgentReward>,
    pub p2_rate: Option<AgentReward>,
    pub comments: String,
    pub observation: Option<SimulatedObservation>,
}

impl EnvResponse {
    /// Fold a terminal-evaluator response into this per-turn response:
    /// missing rates are filled in, comments are concatenated.
    pub fn merge_terminal(&mut self, terminal: EnvResponse) {
        if self.p1_rate.is_none() {
            self.p1_rate = terminal.p1_rate;
        }
        if self.p2_rate.is_none() {
            self.p2_rate = terminal.p2_rate;
        }
        if !terminal.comments.is_empty() {
            self.comments.push_str(&terminal.comments);
        }
    }
}

/// Reduce one scope's entries dimension-wise.
///
/// All-bool dimensions AND; all-numeric dimensions sum; a dimension mixing
/// the two is an invariant violation.  Reasonings are newline-joined.
fn reduce(entries: &[&EvalEntry]) -> Result<(BTreeMap<String, f64>, String), AggregateError> {
    let mut by_dimension: BTreeMap<String, Vec<ScoreValue>> = BTreeMap::new();
    let mut reasonings: Vec<&str> = Vec::new();
    for entry in entries {
        by_dimension.entry(entry.dimension.clone()).or_default().push(entry.value);
        if !entry.reasoning.is_empty() {
            reasonings.push(&entry.reasoning);
        }
    }

    let mut reduced = BTreeMap::new();
    for (dimension, values) in by_dimension {
        let bools = values.iter().filter(|v| v.is_bool()).count();
        if bools == values.len() {
            let all = values.iter().all(|v| v.as_f64() != 0.0);
            reduced.insert(dimension, if all { 1.0 } else { 0.0 });
        } else if bools == 0 {
            reduced.insert(dimension, values.iter().map(ScoreValue::as_f64).sum());
        } else {
            return Err(AggregateError::MixedTypes(dimension));
        }
    }
    Ok((reduced, reasonings.join("\n")))
}

fn rate_from(dimensions: BTreeMap<String, f64>) -> Option<AgentReward> {
    if dimensions.is_empty() {
        return None;
    }
    let overall = dimensions.get("overall_score").copied().unwrap_or(0.0);
    Some(AgentReward { overall, dimensions })
}

/// Merge one turn's evaluator outputs per the aggregation rule.
pub fn aggregate(outputs: Vec<EvaluatorOutput>) -> Result<EnvResponse, AggregateError> {
    let mut observation: Option<SimulatedObservation> = None;
    let mut environment: Vec<&EvalEntry> = Vec::new();
    let mut agent_1: Vec<&EvalEntry> = Vec::new();
    let mut agent_2: Vec<&EvalEntry> = Vec::new();

    let scores: Vec<&EvalEntry> = outputs
        .iter()
        .filter_map(|o| match o {
            EvaluatorOutput::Score(entry) => Some(entry),
            EvaluatorOutput::Observation(_) => None,
        })
        .collect();
    for output in &outputs {
        if let EvaluatorOutput::Observation(obs) = output {
            if observation.is_some() {
                return Err(AggregateError::MultipleObservations);
            }
            observation = Some(obs.clone());
        }
    }
    for entry in scores {
        match entry.scope.as_str() {
            "environment" => environment.push(entry),
            "agent_1" => agent_1.push(entry),
            "agent_2" => agent_2.push(entry),
            other => return Err(AggregateError::UnknownScope(other.to_string())),
        }
    }

    let (environment_dims, environment_reasoning) = reduce(&environment)?;
    let (agent_1_dims, agent_1_reasoning) = reduce(&agent_1)?;
    let (agent_2_dims, agent_2_reasoning) = reduce(&agent_2)?;

    let mut comments = String::new();
    if !environment_reasoning.is_empty() {
        comments.push_str(&format!("Environment comments: {environment_reasoning}\n"));
    }
    if !agent_1_reasoning.is_empty() {
        comments.push_str(&format!("Agent 1 comments:\n{agent_1_reasoning}\n"));
    }
    if !agent_2_reasoning.is_empty() {
        comments.push_str(&format!("Agent 2 comments:\n{agent_2_reasoning}\n"));
    }

    Ok(EnvResponse {
        terminated: environment_dims.get("terminated").copied().unwrap_or(0.0) != 0.0,
        p1_rate: rate_from(agent_1_dims),
        p2_rate: rate_from(agent_2_dims),
        comments,
        // An empty observation means "no tool ran this turn"; normalise it
        // away so callers can match on `Some` directly.
        observation: observation.filter(|obs| !obs.is_empty()),
    })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
