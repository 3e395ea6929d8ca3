// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use gauntlet_engine::{
    run_one_episode, AiAgent, EngineConfig, Evaluator, GroundingEngine, HumanAgent, LogSink,
    ParallelEnv, RuleBasedTerminatedEvaluator, SafetyLlmEvaluator,
};
use gauntlet_model::{AuthStyle, MockProvider, ModelProvider, OpenAiCompatProvider};
use gauntlet_protocol::{
    render_for_humans, AgentProfile, EpisodeLog, RenderedKind, ScenarioProfile,
};
use gauntlet_tools::{DetailLevel, ToolRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            scenarios,
            codename,
            env_model,
            agent1_model,
            agent2_model,
            tag,
            output,
            config,
        } => {
            run_cmd(
                &scenarios,
                &codename,
                &env_model,
                &agent1_model,
                &agent2_model,
                tag,
                output,
                config,
            )
            .await
        }
        Commands::Render { log } => render_cmd(&log),
        Commands::ListToolkits => list_toolkits_cmd(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GAUNTLET_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Resolve a model spec string to a provider.
///
/// Accepted forms: `mock`, `openai:<model>` (key from OPENAI_API_KEY), and
/// `local:<model>@<base-url>` for unauthenticated OpenAI-compatible servers.
fn provider_from_spec(spec: &str) -> anyhow::Result<Arc<dyn ModelProvider>> {
    if spec == "mock" {
        return Ok(Arc::new(MockProvider));
    }
    if let Some(model) = spec.strip_prefix("openai:") {
        let key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set for openai: model specs")?;
        return Ok(Arc::new(OpenAiCompatProvider::new(
            "openai",
            model.to_string(),
            Some(key),
            "https://api.openai.com/v1",
            None,
            AuthStyle::Bearer,
        )));
    }
    if let Some(rest) = spec.strip_prefix("local:") {
        let (model, base_url) = rest
            .split_once('@')
            .context("local: specs take the form local:<model>@<base-url>")?;
        return Ok(Arc::new(OpenAiCompatProvider::new(
            "local",
            model.to_string(),
            None,
            base_url,
            None,
            AuthStyle::None,
        )));
    }
    bail!("unknown model spec '{spec}' (expected mock, openai:<model>, or local:<model>@<url>)")
}

/// Log sink appending one JSON document per line.
struct JsonlSink {
    path: PathBuf,
}

impl LogSink for JsonlSink {
    fn save(&self, log: &EpisodeLog) -> anyhow::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let line = serde_json::to_string(log)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_cmd(
    scenarios: &Path,
    codename: &str,
    env_model: &str,
    agent1_model: &str,
    agent2_model: &str,
    tag: Option<String>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let raw = fs::read_to_string(scenarios)
        .with_context(|| format!("reading {}", scenarios.display()))?;
    let mut profiles = ScenarioProfile::load_map(&raw).context("parsing scenario file")?;
    let profile = profiles
        .remove(codename)
        .with_context(|| format!("scenario '{codename}' not found in the file"))?;

    let cfg = match config {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::from_yaml(&raw).context("parsing engine config")?
        }
        None => EngineConfig::default(),
    };
    let opts = cfg.generate_options();

    let engine_provider = provider_from_spec(env_model)?;
    let registry = Arc::new(ToolRegistry::builtin());
    let grounding = GroundingEngine::new(engine_provider.clone(), registry, opts.clone());
    let evaluators: Vec<Arc<dyn Evaluator>> = vec![Arc::new(
        RuleBasedTerminatedEvaluator::new(cfg.max_turn_number, cfg.max_stale_turn),
    )];
    let terminal_evaluators: Vec<Arc<dyn Evaluator>> = vec![Arc::new(SafetyLlmEvaluator::new(
        engine_provider,
        opts.clone(),
    ))];
    let env = ParallelEnv::new(profile, cfg, grounding, evaluators, terminal_evaluators);

    let human = HumanAgent::new(
        AgentProfile::new("Riley", "Park").with_occupation("Software Engineer"),
        provider_from_spec(agent1_model)?,
        opts.clone(),
    );
    let ai = AiAgent::new(
        AgentProfile::new("Nova", "Assistant").with_occupation("AI Assistant"),
        provider_from_spec(agent2_model)?,
        opts,
    );

    let log = match output {
        Some(path) => {
            let sink = JsonlSink { path };
            run_one_episode(env, [Box::new(human), Box::new(ai)], tag, &sink).await?
        }
        None => {
            run_one_episode(env, [Box::new(human), Box::new(ai)], tag, &gauntlet_engine::NullSink)
                .await?
        }
    };

    print_rendered(&log);
    Ok(())
}

fn render_cmd(path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let log: EpisodeLog = serde_json::from_str(&raw).context("parsing episode log")?;
    print_rendered(&log);
    Ok(())
}

fn print_rendered(log: &EpisodeLog) {
    for message in render_for_humans(log) {
        match message.kind {
            RenderedKind::Divider => println!("{0} {1} {0}", "=".repeat(30), message.content),
            RenderedKind::Info => println!("[{}]\n{}\n", message.role, message.content),
            _ => println!("{}: {}", message.role, message.content),
        }
    }
    println!(
        "\nRewards: {}",
        log.rewards
            .iter()
            .enumerate()
            .map(|(i, r)| format!("agent {} → {:.1}", i + 1, r.overall))
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn list_toolkits_cmd() -> anyhow::Result<()> {
    let registry = ToolRegistry::builtin();
    for name in registry.toolkit_names() {
        for kit in registry.toolkits_by_name(&[name]) {
            println!("{}\n", kit.describe(DetailLevel::Low));
        }
    }
    Ok(())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
