//! Text rendering for the terminal front-end

use std::fmt::Write;

use crate::core::SessionSummary;
use crate::session::view::{ActivePanel, AWAITING_PLACEHOLDER};
use crate::session::{format_score, SessionController, Transcript};

pub fn banner() -> String {
    "CoPilot.AI\nAutonomous assessment protocol initiated.\n".to_string()
}

/// The active question card
pub fn active(controller: &SessionController) -> String {
    let Some(message) = controller.active_message() else {
        return format!("{}\n", AWAITING_PLACEHOLDER);
    };

    let panel = ActivePanel::from_message(message);
    let mut out = String::new();

    if let Some(round) = panel.round {
        let _ = writeln!(out, "// {} Protocol", round.to_uppercase());
    }
    if let Some(summary) = panel.feedback_summary {
        let _ = writeln!(out, "Feedback on previous answer: \"{}\"", summary);
    }
    let _ = writeln!(out, "\n  {}\n", panel.headline);
    out
}

/// The hint under the input line
pub fn status_line(controller: &SessionController) -> &'static str {
    if controller.is_completed() {
        "Session terminated. Type /export to download your report."
    } else if controller.is_dictation_active() {
        "LISTENING... (/dictate to stop, empty line to send)"
    } else if controller.is_pending() {
        "Evaluating..."
    } else if controller.is_dictation_available() {
        "Type your answer or /dictate, then press Enter. /help for commands."
    } else {
        "Type your answer and press Enter. /help for commands."
    }
}

pub fn transcript(transcript: &Transcript) -> String {
    let mut out = String::new();
    for message in transcript.messages() {
        let time = message.created_at.format("%H:%M:%S");
        let who = if message.is_bot() { "Bot" } else { "You" };
        let _ = match &message.round {
            Some(round) => writeln!(out, "[{}] {} ({}): {}", time, who, round, message.text),
            None => writeln!(out, "[{}] {}: {}", time, who, message.text),
        };
    }
    out
}

pub fn score_summary(transcript: &Transcript) -> Option<String> {
    transcript.score_summary().map(|summary| {
        format!(
            "Average score: {}/5 across {} answer(s)",
            format_score(summary.average),
            summary.answers_scored
        )
    })
}

pub fn history(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No archived interviews.\n".to_string();
    }

    let mut out = String::new();
    for session in sessions {
        let status = if session.completed { "completed" } else { "in progress" };
        let score = session
            .average_score
            .map(|s| format!("{}/5", format_score(s)))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{}  {}  {}  {} messages  score {}  ({})",
            session.session_id,
            session.candidate.as_deref().unwrap_or("unknown"),
            status,
            session.message_count,
            score,
            session.updated_at,
        );
    }
    out
}

pub fn help() -> &'static str {
    "Commands:\n  /dictate     toggle dictation\n  /export      download the report (after completion)\n  /transcript  show the full transcript\n  /quit        leave\n  (empty line) send the dictated answer\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Feedback, Message};

    #[test]
    fn test_active_before_session() {
        let controller = SessionController::new(false);
        assert!(active(&controller).contains("Awaiting"));
        assert!(status_line(&controller).contains("Type your answer"));
    }

    #[test]
    fn test_transcript_rendering() {
        let mut messages = Transcript::new();
        messages.push(Message::question("Tell me about yourself", "behavioural"));
        messages.push(Message::user("I build backend systems"));

        let rendered = transcript(&messages);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Bot (behavioural): Tell me about yourself"));
        assert!(lines[1].ends_with("You: I build backend systems"));
    }

    #[test]
    fn test_score_summary_rendering() {
        let mut transcript = Transcript::new();
        assert!(score_summary(&transcript).is_none());

        transcript.push(Message::feedback(Feedback {
            score: 4.5,
            feedback: "Great".into(),
        }));
        assert_eq!(
            score_summary(&transcript).unwrap(),
            "Average score: 4.5/5 across 1 answer(s)"
        );
    }

    #[test]
    fn test_history_rendering() {
        assert!(history(&[]).contains("No archived"));

        let sessions = vec![SessionSummary {
            session_id: "s1".into(),
            candidate: Some("Alice".into()),
            completed: true,
            updated_at: "2024-05-01 10:00:00".into(),
            message_count: 7,
            average_score: Some(4.0),
        }];
        let rendered = history(&sessions);
        assert!(rendered.contains("s1  Alice  completed  7 messages  score 4/5"));
    }
}
