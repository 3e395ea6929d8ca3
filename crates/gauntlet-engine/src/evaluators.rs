// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The evaluator interface and the rule-based per-turn evaluator.
//!
//! Evaluators observe a read-only inbox snapshot and emit scored entries;
//! the grounding engine shares the same interface but emits a simulated
//! observation instead.  The engine joins all of them concurrently and
//! merges their outputs with [`crate::aggregate`].

use async_trait::async_trait;

use gauntlet_protocol::{InboxEntry, SimulatedObservation};

use crate::history::turn_windows;

/// A single scored dimension from one evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalEntry {
    /// `environment`, `agent_1` (human), or `agent_2` (AI).
    pub scope: String,
    pub dimension: String,
    pub value: ScoreValue,
    pub reasoning: String,
}

impl EvalEntry {
    pub fn new(
        scope: impl Into<String>,
        dimension: impl Into<String>,
        value: ScoreValue,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            dimension: dimension.into(),
            value,
            reasoning: reasoning.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ScoreValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ScoreValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ScoreValue::Int(i) => *i as f64,
            ScoreValue::Float(f) => *f,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ScoreValue::Bool(_))
    }
}

/// One item of an evaluator's result.
#[derive(Debug, Clone)]
pub enum EvaluatorOutput {
    Score(EvalEntry),
    Observation(SimulatedObservation),
}

/// Anything the engine can join per turn: per-turn evaluators, terminal
/// evaluators, and the grounding engine.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, turn_number: usize, inbox: &[InboxEntry]) -> Vec<EvaluatorOutput>;

    /// The prompt a terminal evaluator scored with, for the episode log.
    fn rewards_prompt(&self) -> Option<String> {
        None
    }
}

/// Decides termination: the turn ceiling is reached, or the conversation has
/// stalled for too many consecutive turns.
///
/// Staleness is recomputed from the inbox snapshot on every call — a turn is
/// stale when every non-environment message in its window is absent or
/// `did nothing` — so the evaluator itself is stateless and its output is a
/// pure function of the transcript.
pub struct RuleBasedTerminatedEvaluator {
    pub max_turn_number: usize,
    pub max_stale_turn: usize,
}

impl RuleBasedTerminatedEvaluator {
    pub fn new(max_turn_number: usize, max_stale_turn: usize) -> Self {
        Self { max_turn_number, max_stale_turn }
    }

    /// Count the consecutive stale turns at the tail of the transcript.
    pub fn stale_count(inbox: &[InboxEntry]) -> usize {
        turn_windows(inbox)
            .iter()
            .rev()
            .take_while(|window| {
                window.iter().all(|(sender, message)| {
                    sender == gauntlet_protocol::ENVIRONMENT
                        || message.to_natural_language().contains("did nothing")
                })
            })
            .count()
    }
}

#[async_trait]
impl Evaluator for RuleBasedTerminatedEvaluator {
    async fn evaluate(&self, turn_number: usize, inbox: &[InboxEntry]) -> Vec<EvaluatorOutput> {
        let stale = Self::stale_count(inbox);
        let out_of_turns = turn_number >= self.max_turn_number;
        let stalled = stale >= self.max_stale_turn;
        let reasoning = if out_of_turns {
            "The conversation reached the maximum number of turns.".to_string()
        } else if stalled {
            format!("No agent made a substantive contribution for {stale} consecutive turns.")
        } else {
            String::new()
        };
        vec![EvaluatorOutput::Score(EvalEntry::new(
            "environment",
            "terminated",
            ScoreValue::Bool(out_of_turns || stalled),
            reasoning,
        ))]
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_protocol::{AgentAction, Message, ENVIRONMENT};

    fn delimiter(k: usize) -> InboxEntry {
        (ENVIRONMENT.to_string(), Message::turn_delimiter(k))
    }

    fn action(sender: &str, action: AgentAction) -> InboxEntry {
        (sender.to_string(), Message::Action(action))
    }

    fn terminated(outputs: &[EvaluatorOutput]) -> bool {
        outputs.iter().any(|o| {
            matches!(
                o,
                EvaluatorOutput::Score(EvalEntry {
                    dimension,
                    value: ScoreValue::Bool(true),
                    ..
                }) if dimension == "terminated"
            )
        })
    }

    #[tokio::test]
    async fn does_not_terminate_active_conversation() {
        let evaluator = RuleBasedTerminatedEvaluator::new(20, 2);
        let inbox = vec![delimiter(1), action("Ada", AgentAction::speak("hi"))];
        let out = evaluator.evaluate(1, &inbox).await;
        assert!(!terminated(&out));
    }

    #[tokio::test]
    async fn terminates_at_turn_ceiling() {
        let evaluator = RuleBasedTerminatedEvaluator::new(3, 10);
        let inbox = vec![delimiter(3), action("Ada", AgentAction::speak("hi"))];
        let out = evaluator.evaluate(3, &inbox).await;
        assert!(terminated(&out));
    }

    #[tokio::test]
    async fn terminates_after_consecutive_stale_turns() {
        let evaluator = RuleBasedTerminatedEvaluator::new(20, 2);
        let inbox = vec![
            delimiter(1),
            action("Ada", AgentAction::speak("hi")),
            delimiter(2),
            action("Ada", AgentAction::none()),
            action("Bot", AgentAction::none()),
            delimiter(3),
            action("Ada", AgentAction::none()),
            action("Bot", AgentAction::none()),
        ];
        assert_eq!(RuleBasedTerminatedEvaluator::stale_count(&inbox), 2);
        let out = evaluator.evaluate(3, &inbox).await;
        assert!(terminated(&out));
    }

    #[tokio::test]
    async fn active_turn_resets_the_stale_tail() {
        let inbox = vec![
            delimiter(1),
            action("Ada", AgentAction::none()),
            delimiter(2),
            action("Ada", AgentAction::speak("still here")),
        ];
        assert_eq!(RuleBasedTerminatedEvaluator::stale_count(&inbox), 0);
        let evaluator = RuleBasedTerminatedEvaluator::new(20, 2);
        let out = evaluator.evaluate(2, &inbox).await;
        assert!(!terminated(&out));
    }

    #[test]
    fn score_value_as_f64() {
        assert_eq!(ScoreValue::Bool(true).as_f64(), 1.0);
        assert_eq!(ScoreValue::Int(-7).as_f64(), -7.0);
        assert_eq!(ScoreValue::Float(2.5).as_f64(), 2.5);
    }
}
