//! What the interview screen shows for the active message

use super::{Message, FEEDBACK_PREFIX};

/// Headline shown when a feedback message has nothing after its first line
pub const PROCEEDING_PLACEHOLDER: &str = "Proceeding to next step...";

/// Shown before the first question arrives
pub const AWAITING_PLACEHOLDER: &str = "[SYSTEM] Awaiting input...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePanel<'a> {
    pub round: Option<&'a str>,
    /// Summary of the feedback on the previous answer
    pub feedback_summary: Option<&'a str>,
    pub headline: &'a str,
}

impl<'a> ActivePanel<'a> {
    pub fn from_message(message: &'a Message) -> Self {
        if message.feedback.is_none() {
            return Self {
                round: message.round.as_deref(),
                feedback_summary: None,
                headline: &message.text,
            };
        }

        let (first, rest) = message
            .text
            .split_once('\n')
            .unwrap_or((message.text.as_str(), ""));

        let summary = first.strip_prefix(FEEDBACK_PREFIX).unwrap_or(first);
        let rest = rest.trim();

        Self {
            round: message.round.as_deref(),
            feedback_summary: Some(summary),
            headline: if rest.is_empty() {
                PROCEEDING_PLACEHOLDER
            } else {
                rest
            },
        }
    }
}
