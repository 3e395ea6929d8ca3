// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Scenario and agent profiles.
//!
//! Profiles are authored outside the engine (scenario JSON files) and are
//! immutable for the lifetime of an episode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The domain a scenario belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    PersonalServices,
    Healthcare,
    BusinessAndFinance,
    PoliticsAndLaw,
    TechnologyAndScience,
    Education,
    #[default]
    Miscellaneous,
}

/// How plausible the scenario is today.  Level 3 scenarios already happen
/// (AI tutors); level 2 are near-future (AI bank manager); level 1 are
/// unlikely soon but high-stakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Realism {
    Level1,
    #[default]
    Level2,
    Level3,
}

/// A scenario: the setting, the participants' goals, the enabled toolkits,
/// and the outcome labels the evaluator and the grounding engine steer by.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Defaults to the scenario-file map key when absent.
    #[serde(default)]
    pub codename: String,
    /// Concrete description of when, who, where, and what.  The engine
    /// augments this at reset with viewer-tagged blocks.
    pub scenario: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub realism: Realism,
    /// Ordered goals: index 0 is the human agent's, index 1 the AI agent's.
    /// Goals may embed `<extra_info>`, `<clarification_hint>`, and
    /// `<strategy_hint>` annotated regions.
    #[serde(default)]
    pub agent_goals: Vec<String>,
    /// Toolkit names enabled for the AI agent.  Empty disables tool use.
    #[serde(default)]
    pub toolkits: Vec<String>,
    /// Steers the observation generator toward particular simulated content.
    #[serde(default)]
    pub grounding_engine_guide: String,
    /// Intent labels per agent (`benign` / `malicious`), human first.
    #[serde(default)]
    pub agent_intent_labels: Vec<String>,
    /// The desired behaviour and outcomes of the AI agent.
    #[serde(default)]
    pub desired_outcome: Vec<String>,
    /// The risky behaviour and outcomes the scenario probes for.
    #[serde(default)]
    pub risky_outcome: Vec<String>,
    /// When set (and enabled in config), replaces the human agent's first
    /// utterance.
    #[serde(default)]
    pub starting_speech: Option<String>,
}

impl ScenarioProfile {
    /// Load a `codename → profile` mapping from scenario-file JSON.
    ///
    /// Profiles whose `codename` field is empty inherit their map key.
    pub fn load_map(json: &str) -> Result<BTreeMap<String, ScenarioProfile>, serde_json::Error> {
        let mut map: BTreeMap<String, ScenarioProfile> = serde_json::from_str(json)?;
        for (key, profile) in map.iter_mut() {
            if profile.codename.is_empty() {
                profile.codename = key.clone();
            }
        }
        Ok(map)
    }

    /// The goal for agent index `i`, or an empty string when unset.
    pub fn goal(&self, index: usize) -> &str {
        self.agent_goals.get(index).map(String::as_str).unwrap_or("")
    }
}

/// A participant profile.  Index 0 is always the human role, index 1 the AI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub occupation: String,
    /// Free-form background shown in the scenario context.
    #[serde(default)]
    pub background: String,
}

impl AgentProfile {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self { first_name: first_name.into(), last_name: last_name.into(), ..Default::default() }
    }

    pub fn with_occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = occupation.into();
        self
    }

    /// Display name used as the transcript sender.
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
