// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gauntlet_model::GenerateOptions;

/// Serde default helper — returns `true`.
///
/// Used for config fields that should be enabled unless the user explicitly
/// sets them to `false`.  `#[serde(default)]` on a `bool` always falls back
/// to `bool::default()` (i.e. `false`), so a named function is required.
fn default_true() -> bool {
    true
}

fn default_max_turn_number() -> usize {
    20
}

fn default_max_stale_turn() -> usize {
    2
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    4
}

/// Which agents may act on a given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionOrder {
    /// Both agents act every turn.
    Simultaneous,
    /// Agents alternate; a tool observation hands the AI the next turn too.
    #[default]
    RoundRobin,
    /// One uniformly-chosen agent acts each turn.
    Random,
}

/// Engine configuration.  Every field has a serde default so partial YAML
/// files work; [`EngineConfig::default`] is the all-defaults instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub action_order: ActionOrder,
    /// Hard turn ceiling for one episode.
    #[serde(default = "default_max_turn_number")]
    pub max_turn_number: usize,
    /// Consecutive no-progress turns before termination.
    #[serde(default = "default_max_stale_turn")]
    pub max_stale_turn: usize,
    /// When true, tool observations are visible to both agents; when false
    /// they are wrapped in an AI-only viewer block.
    #[serde(default)]
    pub share_observation: bool,
    /// Replace the human agent's first utterance with the scenario's
    /// `starting_speech` when one is authored.
    #[serde(default = "default_true")]
    pub use_starting_speech: bool,
    /// Under round-robin, give the AI the next turn again after a tool
    /// observation (the human is paused).  Disable for plain alternation.
    #[serde(default = "default_true")]
    pub relock_on_observation: bool,
    /// Which agent index holds the floor on the first round-robin turn.
    #[serde(default)]
    pub first_actor: usize,
    /// Seed for the `random` action order.  `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Deadline for a single LLM round-trip.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// Maximum episodes driven in parallel by the batch driver.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_order: ActionOrder::default(),
            max_turn_number: default_max_turn_number(),
            max_stale_turn: default_max_stale_turn(),
            share_observation: false,
            use_starting_speech: true,
            relock_on_observation: true,
            first_actor: 0,
            seed: None,
            temperature: default_temperature(),
            llm_timeout_secs: default_llm_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// The generation options every LLM call in this episode uses.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
