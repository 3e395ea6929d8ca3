// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Inbox rendering and turn-window helpers shared by the grounding engine
//! and the evaluators.

use gauntlet_protocol::{InboxEntry, ENVIRONMENT};

/// Linearize the inbox for environment-side consumers (the observation
/// simulator and the terminal evaluator).
///
/// Inactive entries (`did nothing`) are dropped; environment messages render
/// bare, agent messages render as `<sender> <message>`.
pub fn history_for_environment(inbox: &[InboxEntry]) -> String {
    inbox
        .iter()
        .filter_map(|(sender, message)| {
            let text = message.to_natural_language();
            if text.contains("did nothing") {
                return None;
            }
            if sender == ENVIRONMENT {
                Some(text)
            } else {
                Some(format!("{sender} {text}"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split the inbox into per-turn windows.
///
/// The slice before the first `Turn #k` delimiter (the scenario background)
/// is not part of any window.  Each window starts right after its delimiter.
pub fn turn_windows(inbox: &[InboxEntry]) -> Vec<&[InboxEntry]> {
    let mut starts: Vec<usize> = Vec::new();
    for (idx, (_, message)) in inbox.iter().enumerate() {
        if message.as_turn_delimiter().is_some() {
            starts.push(idx);
        }
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(inbox.len());
            &inbox[start + 1..end]
        })
        .collect()
}

/// The messages of the current (latest) turn: everything after the last
/// `Turn #k` delimiter.
pub fn current_turn_window(inbox: &[InboxEntry]) -> &[InboxEntry] {
    let last_delimiter = inbox
        .iter()
        .rposition(|(_, message)| message.as_turn_delimiter().is_some());
    match last_delimiter {
        Some(idx) => &inbox[idx + 1..],
        None => &[],
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_protocol::{AgentAction, Message};

    fn entry(sender: &str, message: Message) -> InboxEntry {
        (sender.to_string(), message)
    }

    fn sample_inbox() -> Vec<InboxEntry> {
        vec![
            entry(ENVIRONMENT, Message::simple("background")),
            entry(ENVIRONMENT, Message::turn_delimiter(1)),
            entry("Ada", Message::Action(AgentAction::speak("hello"))),
            entry("Bot", Message::Action(AgentAction::none())),
            entry(ENVIRONMENT, Message::turn_delimiter(2)),
            entry("Bot", Message::Action(AgentAction::speak("hi"))),
        ]
    }

    #[test]
    fn history_drops_did_nothing_and_prefixes_senders() {
        let history = history_for_environment(&sample_inbox());
        assert!(history.contains("Ada said: \"hello\""));
        assert!(!history.contains("did nothing"));
        assert!(history.contains("Turn #1"));
        assert!(history.starts_with("background"));
    }

    #[test]
    fn turn_windows_split_on_delimiters() {
        let inbox = sample_inbox();
        let windows = turn_windows(&inbox);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 2);
        assert_eq!(windows[1].len(), 1);
    }

    #[test]
    fn current_turn_window_is_the_tail() {
        let inbox = sample_inbox();
        let window = current_turn_window(&inbox);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].0, "Bot");
    }

    #[test]
    fn current_turn_window_empty_before_first_turn() {
        let inbox = vec![entry(ENVIRONMENT, Message::simple("background"))];
        assert!(current_turn_window(&inbox).is_empty());
    }
}
