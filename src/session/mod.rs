//! Interview session types and state management

mod controller;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use controller::{AnswerRequest, BeginRequest, Notice, SessionController, SessionError};

/// Generic notice appended when an answer could not be processed
pub const ANSWER_ERROR_TEXT: &str = "Error processing answer. Please try again.";

/// Prefix of the composite feedback text
pub const FEEDBACK_PREFIX: &str = "💡 Feedback: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Sender::User),
            "bot" => Some(Sender::Bot),
            _ => None,
        }
    }
}

/// Evaluation of the candidate's previous answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: f64,
    pub feedback: String,
}

impl Feedback {
    /// Display text for a feedback message, e.g. `💡 Feedback: Good clarity (Score: 4/5)`
    pub fn composite_text(&self) -> String {
        format!(
            "{}{} (Score: {}/5)",
            FEEDBACK_PREFIX,
            self.feedback,
            format_score(self.score)
        )
    }
}

/// Scores are averages; show at most two decimals and drop trailing zeros.
pub fn format_score(score: f64) -> String {
    let rounded = format!("{:.2}", score);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// One turn in the visible transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            round: None,
            feedback: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn question(text: impl Into<String>, round: impl Into<String>) -> Self {
        let mut message = Self::new(Sender::Bot, text);
        message.round = Some(round.into());
        message
    }

    pub fn feedback(feedback: Feedback) -> Self {
        let mut message = Self::new(Sender::Bot, feedback.composite_text());
        message.feedback = Some(feedback);
        message
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Number of feedback messages and their mean score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub answers_scored: usize,
    pub average: f64,
}

/// Append-only, ordered message history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a transcript from stored messages, preserving their order.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent bot message
    pub fn last_bot(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_bot())
    }

    pub fn score_summary(&self) -> Option<ScoreSummary> {
        let scores: Vec<f64> = self
            .messages
            .iter()
            .filter_map(|m| m.feedback.as_ref().map(|f| f.score))
            .collect();

        if scores.is_empty() {
            return None;
        }

        Some(ScoreSummary {
            answers_scored: scores.len(),
            average: scores.iter().sum::<f64>() / scores.len() as f64,
        })
    }
}
