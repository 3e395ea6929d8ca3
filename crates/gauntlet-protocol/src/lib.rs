// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Shared data model for the simulation engine: transcript messages,
//! scenario/agent profiles, viewer-tagged redaction, and episode logs.

mod log;
mod messages;
mod profile;
mod render;

pub use log::{render_for_humans, AgentReward, EpisodeLog, RenderedKind, RenderedMessage};
pub use messages::{
    ActionKind, AgentAction, InboxEntry, Message, Observation, SimulatedObservation, ToolCall,
    ENVIRONMENT,
};
pub use profile::{AgentProfile, Domain, Realism, ScenarioProfile};
pub use render::{actions_to_natural_language, extra_info_block, render_for_viewer, Viewer};
