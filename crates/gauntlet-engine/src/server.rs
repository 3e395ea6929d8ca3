// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Driving episodes to completion and emitting episode logs.

use futures::StreamExt;
use tracing::{error, warn};

use gauntlet_protocol::{AgentProfile, AgentReward, EpisodeLog, Observation, ENVIRONMENT};

use crate::agents::Agent;
use crate::env::ParallelEnv;

/// Where finished episode logs go.  Injected by the caller; a sink failure
/// is logged and never fails the episode.
pub trait LogSink: Send + Sync {
    fn save(&self, log: &EpisodeLog) -> anyhow::Result<()>;
}

/// A sink that drops every log.  Useful for tests and dry runs.
pub struct NullSink;

impl LogSink for NullSink {
    fn save(&self, _log: &EpisodeLog) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One episode waiting to run.
pub struct EnvAgentCombo {
    pub env: ParallelEnv,
    pub agents: [Box<dyn Agent>; 2],
}

/// Drive one episode to termination and emit its log.
///
/// On an aggregation invariant violation the episode ends abnormally: the
/// partial log (with a diagnostic comment) is still emitted to the sink, and
/// the error is propagated to the caller.
pub async fn run_one_episode(
    mut env: ParallelEnv,
    mut agents: [Box<dyn Agent>; 2],
    tag: Option<String>,
    sink: &dyn LogSink,
) -> anyhow::Result<EpisodeLog> {
    for (index, agent) in agents.iter_mut().enumerate() {
        agent.set_goal(env.profile.goal(index).to_string());
    }

    let profiles: [AgentProfile; 2] =
        [agents[0].profile().clone(), agents[1].profile().clone()];
    let mut observations: [Observation; 2] = env.reset(&profiles);

    let mut log = EpisodeLog::new(env.profile.codename.clone());
    log.tag = tag;
    log.agents = env.agent_names().to_vec();
    log.models = vec![env.model_name(), agents[0].model_name(), agents[1].model_name()];
    log.messages.push(environment_group(&env, &observations));

    loop {
        let (action_0, action_1) = {
            let (left, right) = agents.split_at_mut(1);
            tokio::join!(left[0].act(&observations[0]), right[0].act(&observations[1]))
        };

        if let Some(turn_group) = log.messages.last_mut() {
            turn_group.push((
                env.agent_names()[0].clone(),
                ENVIRONMENT.to_string(),
                action_0.to_natural_language(),
            ));
            turn_group.push((
                env.agent_names()[1].clone(),
                ENVIRONMENT.to_string(),
                action_1.to_natural_language(),
            ));
        }

        let step = match env.astep([action_0, action_1]).await {
            Ok(step) => step,
            Err(e) => {
                // Invariant violation: emit the partial log with a
                // diagnostic comment, then propagate.
                log.reasoning = format!("episode aborted: {e}");
                emit(sink, &log);
                return Err(e);
            }
        };

        log.messages.push(environment_group(&env, &step.observations));

        if step.terminated.iter().all(|t| *t) {
            log.reasoning = step.info.comments.clone();
            log.rewards = step
                .info
                .ratings
                .iter()
                .map(|rating| rating.clone().unwrap_or_else(AgentReward::zero))
                .collect();
            log.rewards_prompt = step.info.rewards_prompt.clone().unwrap_or_default();
            break;
        }

        observations = step.observations;
    }

    emit(sink, &log);
    Ok(log)
}

/// One log group of environment → agent messages.
fn environment_group(
    env: &ParallelEnv,
    observations: &[Observation; 2],
) -> Vec<(String, String, String)> {
    env.agent_names()
        .iter()
        .zip(observations.iter())
        .map(|(name, obs)| (ENVIRONMENT.to_string(), name.clone(), obs.to_natural_language()))
        .collect()
}

fn emit(sink: &dyn LogSink, log: &EpisodeLog) {
    if let Err(e) = sink.save(log) {
        error!(episode = %log.id, error = %e, "failed to save episode log");
    }
}

/// Run a batch of episodes with bounded parallelism.
///
/// Episodes are independent tasks; `max_concurrent` bounds the number in
/// flight.  Failed episodes are reported in place, never retried here —
/// upstream drivers may re-queue them by tag.
pub async fn run_batch(
    combos: Vec<EnvAgentCombo>,
    tag: Option<String>,
    sink: &dyn LogSink,
    max_concurrent: usize,
) -> Vec<anyhow::Result<EpisodeLog>> {
    let results: Vec<anyhow::Result<EpisodeLog>> = futures::stream::iter(
        combos.into_iter().map(|combo| {
            let tag = tag.clone();
            async move { run_one_episode(combo.env, combo.agents, tag, sink).await }
        }),
    )
    .buffer_unordered(max_concurrent.max(1))
    .collect()
    .await;

    let failures = results.iter().filter(|r| r.is_err()).count();
    if failures > 0 {
        warn!(failures, total = results.len(), "batch finished with failed episodes");
    }
    results
}
