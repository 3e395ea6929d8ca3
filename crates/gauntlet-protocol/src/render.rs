// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Viewer-tagged redaction and transcript rendering.
//!
//! The engine stores one canonical scenario prose; information that only some
//! participants may see is wrapped in `<extra_info viewer='…'>` blocks.
//! [`render_for_viewer`] is the pure filter that produces each participant's
//! view: addressed blocks are unwrapped, everything else is stripped.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::messages::AgentAction;

/// Who a piece of scenario text is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// The omniscient view used by evaluators and the grounding engine.
    Environment,
    /// Agent by index (0 = human role, 1 = AI role).
    Agent(usize),
}

impl Viewer {
    /// The tag value used inside `viewer='…'` attributes.
    pub fn tag(&self) -> String {
        match self {
            Viewer::Environment => "environment".to_string(),
            Viewer::Agent(i) => format!("agent_{i}"),
        }
    }
}

fn extra_info_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<extra_info viewer='([a-z_0-9]+)'>(.*?)</extra_info>").unwrap()
    })
}

/// Wrap `content` in a viewer-tagged block.
pub fn extra_info_block(viewer: Viewer, content: &str) -> String {
    format!("<extra_info viewer='{}'>{}</extra_info>", viewer.tag(), content)
}

/// Filter viewer-tagged text for one viewer.
///
/// Blocks addressed to the viewer are unwrapped in place; blocks addressed to
/// anyone else are removed entirely.  The environment viewer is omniscient
/// and sees every block unwrapped.  Untagged text always passes through.
pub fn render_for_viewer(text: &str, viewer: Viewer) -> String {
    let tag = viewer.tag();
    let filtered = extra_info_re().replace_all(text, |caps: &Captures| {
        if viewer == Viewer::Environment || caps[1] == tag {
            caps[2].to_string()
        } else {
            String::new()
        }
    });
    // Collapse blank lines left behind by removed blocks.
    let mut out = String::with_capacity(filtered.len());
    let mut blank_run = 0usize;
    for line in filtered.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Render a set of per-agent actions to the prose both agents observe.
/// `none` actions are reported as inactivity, matching the transcript form.
pub fn actions_to_natural_language(actions: &[(String, AgentAction)]) -> String {
    actions
        .iter()
        .map(|(name, action)| format!("{name} {}", action.to_natural_language()))
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::AgentAction;

    const TAGGED: &str = "A public line.\n\
        <extra_info viewer='environment'>secret outcome labels</extra_info>\n\
        <extra_info viewer='agent_0'>you have 20 turns</extra_info>\n\
        <extra_info viewer='agent_1'>tool instructions</extra_info>\n\
        Another public line.";

    #[test]
    fn agent_0_sees_only_its_block_and_public_text() {
        let view = render_for_viewer(TAGGED, Viewer::Agent(0));
        assert!(view.contains("A public line."));
        assert!(view.contains("you have 20 turns"));
        assert!(!view.contains("secret outcome labels"));
        assert!(!view.contains("tool instructions"));
    }

    #[test]
    fn agent_1_sees_only_its_block_and_public_text() {
        let view = render_for_viewer(TAGGED, Viewer::Agent(1));
        assert!(view.contains("tool instructions"));
        assert!(!view.contains("you have 20 turns"));
        assert!(!view.contains("secret outcome labels"));
    }

    #[test]
    fn environment_sees_everything_unwrapped() {
        let view = render_for_viewer(TAGGED, Viewer::Environment);
        assert!(view.contains("secret outcome labels"));
        assert!(view.contains("you have 20 turns"));
        assert!(view.contains("tool instructions"));
        assert!(!view.contains("<extra_info"), "tags must not leak into any view");
    }

    #[test]
    fn no_view_contains_tag_markup() {
        for viewer in [Viewer::Environment, Viewer::Agent(0), Viewer::Agent(1)] {
            let view = render_for_viewer(TAGGED, viewer);
            assert!(!view.contains("</extra_info>"));
        }
    }

    #[test]
    fn multiline_block_is_handled() {
        let text = "start\n<extra_info viewer='agent_0'>line1\nline2</extra_info>\nend";
        let view = render_for_viewer(text, Viewer::Agent(0));
        assert!(view.contains("line1\nline2"));
        let other = render_for_viewer(text, Viewer::Agent(1));
        assert!(!other.contains("line1"));
        assert!(other.contains("start"));
        assert!(other.contains("end"));
    }

    #[test]
    fn block_builder_round_trips_through_filter() {
        let block = extra_info_block(Viewer::Agent(1), "only for the AI");
        let text = format!("intro\n{block}");
        assert!(render_for_viewer(&text, Viewer::Agent(1)).contains("only for the AI"));
        assert!(!render_for_viewer(&text, Viewer::Agent(0)).contains("only for the AI"));
    }

    #[test]
    fn actions_render_with_sender_names() {
        let actions = vec![
            ("Ada Lovelace".to_string(), AgentAction::speak("pay them")),
            ("X AI".to_string(), AgentAction::none()),
        ];
        let text = actions_to_natural_language(&actions);
        assert_eq!(text, "Ada Lovelace said: \"pay them\"\nX AI did nothing");
    }
}
