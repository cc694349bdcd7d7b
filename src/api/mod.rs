//! Interview service integration

pub mod http;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpInterviewApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Malformed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A question as sent by the interview service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub text: String,
    pub round: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    pub score: f64,
    pub feedback: String,
}

/// Raw body of `POST /start-interview`. Every field is optional so that a
/// malformed body is detected by [`StartResponse::validate`] rather than
/// failing as a transport error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub initial_action: Option<InitialAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialAction {
    #[serde(default)]
    pub question: Option<QuestionPayload>,
}

/// A start response that carries everything the controller needs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStart {
    pub session_id: String,
    pub question: QuestionPayload,
}

impl StartResponse {
    pub fn validate(self) -> Result<SessionStart, ApiError> {
        let session_id = self
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Malformed("missing session_id".to_string()))?;

        let question = self
            .initial_action
            .ok_or_else(|| ApiError::Malformed("missing initial_action".to_string()))?
            .question
            .ok_or_else(|| ApiError::Malformed("missing initial question".to_string()))?;

        Ok(SessionStart {
            session_id,
            question,
        })
    }
}

/// Raw body of `POST /answer`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub feedback: Option<FeedbackPayload>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub question: Option<QuestionPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the service wants to happen after an answer
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    Question(QuestionPayload),
    Completed { message: String },
}

/// A validated answer response
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub feedback: Option<FeedbackPayload>,
    pub next: NextStep,
}

pub const COMPLETED_STATUS: &str = "completed";

/// Closing line used when the service completes without a message
pub const DEFAULT_CLOSING_MESSAGE: &str = "Interview finished. Thank you!";

impl AnswerResponse {
    pub fn validate(self) -> Result<AnswerOutcome, ApiError> {
        if let Some(error) = self.error {
            return Err(ApiError::Malformed(error));
        }

        let next = if self.status.as_deref() == Some(COMPLETED_STATUS) {
            NextStep::Completed {
                message: self
                    .message
                    .unwrap_or_else(|| DEFAULT_CLOSING_MESSAGE.to_string()),
            }
        } else {
            NextStep::Question(
                self.question
                    .ok_or_else(|| ApiError::Malformed("missing next question".to_string()))?,
            )
        };

        Ok(AnswerOutcome {
            feedback: self.feedback,
            next,
        })
    }
}

/// A downloaded interview report
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ReportFile {
    /// Write the report into `dir`, creating it if needed.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, ApiError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// The remote interview service
#[async_trait]
pub trait InterviewApi: Send + Sync {
    async fn start_interview(&self, candidate_name: &str) -> Result<StartResponse, ApiError>;

    async fn submit_answer(&self, session_id: &str, text: &str)
        -> Result<AnswerResponse, ApiError>;

    async fn export_report(&self, session_id: &str) -> Result<ReportFile, ApiError>;
}
