// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::catalog::builtin_toolkits;
use crate::prompt::tool_prompt;
use crate::spec::{DetailLevel, ToolSpec, Toolkit};

/// Central registry holding all available toolkits.
///
/// The registry is populated during process initialization and read-only
/// afterwards; the engine shares it behind an `Arc`.
pub struct ToolRegistry {
    toolkits: BTreeMap<String, Toolkit>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { toolkits: BTreeMap::new() }
    }

    /// A registry pre-loaded with the builtin virtual toolkit catalogue.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for kit in builtin_toolkits() {
            reg.register_toolkit(kit);
        }
        reg
    }

    /// Register a whole toolkit.  A toolkit with the same name is replaced.
    pub fn register_toolkit(&mut self, toolkit: Toolkit) {
        if self.toolkits.contains_key(&toolkit.name) {
            warn!(toolkit = %toolkit.name, "toolkit already registered; replacing");
        }
        self.toolkits.insert(toolkit.name.clone(), toolkit);
    }

    /// Register a single tool into its toolkit, creating the toolkit entry
    /// when it does not exist yet.  A duplicate `(toolkit, tool)` pair
    /// replaces the previous spec with a warning.
    pub fn register(&mut self, spec: ToolSpec) {
        let kit = self
            .toolkits
            .entry(spec.toolkit.clone())
            .or_insert_with(|| Toolkit::new(spec.toolkit.clone(), String::new()));
        if let Some(existing) = kit.tools.iter_mut().find(|t| t.name == spec.name) {
            warn!(tool = %spec.name, toolkit = %spec.toolkit, "tool already registered; replacing");
            *existing = spec;
        } else {
            kit.tools.push(spec);
        }
    }

    /// Map toolkit names to handles.  Unknown names are skipped with a warning.
    pub fn toolkits_by_name(&self, names: &[String]) -> Vec<&Toolkit> {
        names
            .iter()
            .filter_map(|name| {
                let kit = self.toolkits.get(name);
                if kit.is_none() {
                    warn!(toolkit = %name, "unknown toolkit requested; skipping");
                }
                kit
            })
            .collect()
    }

    /// Map toolkit names to `tool name → output schema` parsers.
    pub fn output_parsers_by_name(&self, names: &[String]) -> BTreeMap<String, Value> {
        self.toolkits_by_name(names)
            .into_iter()
            .flat_map(|kit| kit.tools.iter())
            .map(|tool| (tool.name.clone(), tool.output_schema.clone()))
            .collect()
    }

    /// Look up a tool spec by name across all toolkits.
    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.toolkits.values().find_map(|kit| kit.tool(name))
    }

    /// The toolkit a tool belongs to.
    pub fn toolkit_of(&self, tool_name: &str) -> Option<&Toolkit> {
        self.toolkits.values().find(|kit| kit.tool(tool_name).is_some())
    }

    /// All registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .toolkits
            .values()
            .flat_map(|kit| kit.tools.iter().map(|t| t.name.clone()))
            .collect();
        names.sort();
        names
    }

    /// Tool names within the given toolkits only, sorted.
    pub fn tool_names_in(&self, toolkit_names: &[String]) -> Vec<String> {
        let mut names: Vec<String> = self
            .toolkits_by_name(toolkit_names)
            .into_iter()
            .flat_map(|kit| kit.tools.iter().map(|t| t.name.clone()))
            .collect();
        names.sort();
        names
    }

    pub fn toolkit_names(&self) -> Vec<String> {
        self.toolkits.keys().cloned().collect()
    }

    /// Render the tool prompt block for the given toolkits: medium-detail
    /// toolkit descriptions plus the format instructions for `action`
    /// arguments.
    pub fn render_prompt(&self, toolkit_names: &[String]) -> String {
        let kits = self.toolkits_by_name(toolkit_names);
        let descriptions = kits
            .iter()
            .map(|kit| kit.describe(DetailLevel::Medium))
            .collect::<Vec<_>>()
            .join("\n");
        let names = self.tool_names_in(toolkit_names).join(", ");
        tool_prompt(&names, &descriptions)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
