//! Session controller
//!
//! Owns the conversation state and decides what each user action does.
//! Every action is split in two:
//! 1. a request transition (`begin`, `answer`) that validates, applies the
//!    immediate local update and returns the API call to make
//! 2. a resolve transition (`resolve_begin`, `resolve_answer`) that folds
//!    the result of that call back into the state
//!
//! The controller performs no I/O; see `core::Interview` for the runtime.

use thiserror::Error;

use crate::api::{AnswerResponse, ApiError, NextStep, StartResponse};
use crate::dictation::{Dictation, DictationCommand, DictationEvent};

use super::{Feedback, Message, Transcript, ANSWER_ERROR_TEXT};

/// Why an action was refused. A refused action never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session has not started")]
    NotStarted,

    #[error("A request is already in flight")]
    Busy,

    #[error("Interview is completed")]
    Completed,

    #[error("Interview is not completed yet")]
    NotCompleted,

    #[error("Dictation is not available")]
    DictationUnavailable,
}

/// Call "start interview" with this name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginRequest {
    pub candidate_name: String,
}

/// Call "submit answer" with this session and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub session_id: String,
    pub text: String,
    /// Dictation was cut short by the submission
    pub dictation: Option<DictationCommand>,
}

/// A user-visible error raised while starting a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    candidate_name: Option<String>,
    session_id: Option<String>,
    transcript: Transcript,
    completed: bool,
    pending: bool,
    draft_input: String,
    dictation: Dictation,
}

impl SessionController {
    pub fn new(dictation_available: bool) -> Self {
        Self {
            candidate_name: None,
            session_id: None,
            transcript: Transcript::new(),
            completed: false,
            pending: false,
            draft_input: String::new(),
            dictation: Dictation::new(dictation_available),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn candidate_name(&self) -> Option<&str> {
        self.candidate_name.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_started(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    pub fn set_draft_input(&mut self, text: impl Into<String>) {
        self.draft_input = text.into();
    }

    pub fn is_dictation_active(&self) -> bool {
        self.dictation.is_listening()
    }

    pub fn is_dictation_available(&self) -> bool {
        self.dictation.is_available()
    }

    /// The most recent bot message
    pub fn active_message(&self) -> Option<&Message> {
        self.transcript.last_bot()
    }

    pub fn begin(&mut self, candidate_name: &str) -> Result<BeginRequest, SessionError> {
        let name = candidate_name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.session_id.is_some() {
            return Err(SessionError::AlreadyStarted);
        }
        if self.pending {
            return Err(SessionError::Busy);
        }

        self.pending = true;
        tracing::debug!(candidate = name, "starting interview");

        Ok(BeginRequest {
            candidate_name: candidate_name.to_string(),
        })
    }

    pub fn resolve_begin(
        &mut self,
        request: &BeginRequest,
        result: Result<StartResponse, ApiError>,
    ) -> Result<(), Notice> {
        self.pending = false;

        let start = match result.and_then(StartResponse::validate) {
            Ok(start) => start,
            Err(ApiError::Malformed(detail)) => {
                tracing::warn!(%detail, "invalid start response");
                return Err(Notice {
                    message: "Failed to initialize session. Invalid server response.".to_string(),
                    detail,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start interview");
                return Err(Notice {
                    message: "Error starting interview.".to_string(),
                    detail: e.to_string(),
                });
            }
        };

        tracing::info!(session_id = %start.session_id, "interview session started");

        self.candidate_name = Some(request.candidate_name.trim().to_string());
        self.session_id = Some(start.session_id);
        self.transcript
            .push(Message::question(start.question.text, start.question.round));
        Ok(())
    }

    pub fn answer(&mut self, text: &str) -> Result<AnswerRequest, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let session_id = self.session_id.clone().ok_or(SessionError::NotStarted)?;
        if self.pending {
            return Err(SessionError::Busy);
        }
        if self.completed {
            return Err(SessionError::Completed);
        }

        self.transcript.push(Message::user(text));
        self.draft_input.clear();
        let dictation = self.dictation.reset();
        self.pending = true;

        tracing::debug!(%session_id, "submitting answer");

        Ok(AnswerRequest {
            session_id,
            text: text.to_string(),
            dictation,
        })
    }

    pub fn resolve_answer(&mut self, result: Result<AnswerResponse, ApiError>) {
        self.pending = false;

        let outcome = match result.and_then(AnswerResponse::validate) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "failed to process answer");
                self.transcript.push(Message::bot(ANSWER_ERROR_TEXT));
                return;
            }
        };

        if let Some(feedback) = outcome.feedback {
            self.transcript.push(Message::feedback(Feedback {
                score: feedback.score,
                feedback: feedback.feedback,
            }));
        }

        match outcome.next {
            NextStep::Completed { message } => {
                self.completed = true;
                tracing::info!(session_id = ?self.session_id, "interview completed");
                self.transcript.push(Message::bot(message));
            }
            NextStep::Question(question) => {
                tracing::debug!(round = %question.round, "next question");
                self.transcript
                    .push(Message::question(question.text, question.round));
            }
        }
    }

    /// Session id to hand to the report exporter
    pub fn export_session(&self) -> Result<&str, SessionError> {
        if !self.completed {
            return Err(SessionError::NotCompleted);
        }
        self.session_id().ok_or(SessionError::NotStarted)
    }

    /// Release the in-flight flag without folding a result
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    /// Toggle dictation on or off
    pub fn toggle_dictation(&mut self) -> Result<Option<DictationCommand>, SessionError> {
        if !self.dictation.is_available() {
            return Err(SessionError::DictationUnavailable);
        }
        if self.session_id.is_none() {
            return Err(SessionError::NotStarted);
        }
        if self.pending {
            return Err(SessionError::Busy);
        }
        if self.completed {
            return Err(SessionError::Completed);
        }

        let event = if self.dictation.is_listening() {
            DictationEvent::Stop
        } else {
            DictationEvent::Start
        };
        Ok(self.dictation.handle(event, &mut self.draft_input))
    }

    /// Feed an event from the speech capability
    pub fn dictation_event(&mut self, event: DictationEvent) -> Option<DictationCommand> {
        self.dictation.handle(event, &mut self.draft_input)
    }
}
