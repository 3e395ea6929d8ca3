// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Adversarial simulation harness for stress-testing tool-using AI agents.
#[derive(Parser, Debug)]
#[command(name = "gauntlet", version, about)]
pub struct Cli {
    /// Verbose logging to stderr (also honours GAUNTLET_LOG).
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one episode of a scenario and print the transcript.
    Run {
        /// Path to the scenario JSON file (codename → profile mapping).
        #[arg(long, short = 's')]
        scenarios: PathBuf,
        /// Codename of the scenario to run.
        #[arg(long, short = 'n')]
        codename: String,
        /// Engine model spec: `mock`, `openai:<model>`, or
        /// `local:<model>@<base-url>`.
        #[arg(long, default_value = "mock")]
        env_model: String,
        /// Human-role agent model spec.
        #[arg(long, default_value = "mock")]
        agent1_model: String,
        /// AI-role agent model spec.
        #[arg(long, default_value = "mock")]
        agent2_model: String,
        /// Opaque episode tag, e.g. a benchmark grouping tag.
        #[arg(long)]
        tag: Option<String>,
        /// Append the finished episode log to this JSONL file.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Engine config YAML (partial files allowed).
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Pretty-print a saved episode log.
    Render {
        /// Path to a JSON episode log.
        log: PathBuf,
    },

    /// List the builtin toolkits and their tools.
    ListToolkits,
}
