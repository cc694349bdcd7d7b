//! HTTP client for the interview service
//!
//! # Endpoints
//!
//! - `GET /` health check
//! - `POST /start-interview` with `{"candidate_name": ...}`
//! - `POST /answer` with `{"session_id": ..., "answer": ...}`
//! - `GET /export-report/{session_id}` returns the PDF report

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{AnswerResponse, ApiError, InterviewApi, ReportFile, StartResponse};

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    candidate_name: &'a str,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    session_id: &'a str,
    answer: &'a str,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Interview service client configuration
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Base URL of the service (e.g., http://127.0.0.1:8000)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct HttpInterviewApi {
    config: HttpApiConfig,
    client: Client,
}

impl HttpInterviewApi {
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::Request(e)
        }
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::Malformed(format!("Failed to parse response: {} - Body: {}", e, body))
        })
    }

    /// Ask the service whether it is up. Returns its greeting.
    pub async fn ping(&self) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let health: HealthResponse = Self::read_json(response).await?;
        Ok(health.message.unwrap_or_default())
    }
}

#[async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn start_interview(&self, candidate_name: &str) -> Result<StartResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/start-interview"))
            .json(&StartRequest { candidate_name })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::read_json(response).await
    }

    async fn submit_answer(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<AnswerResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/answer"))
            .json(&SubmitRequest {
                session_id,
                answer: text,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::read_json(response).await
    }

    async fn export_report(&self, session_id: &str) -> Result<ReportFile, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/export-report/{}", session_id)))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::check_status(response).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| format!("report_{}.pdf", sanitize_file_name(session_id)));

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(%file_name, size = bytes.len(), "report downloaded");

        Ok(ReportFile { file_name, bytes })
    }
}

/// Extract `filename` from a `Content-Disposition` header value
fn attachment_file_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let name = sanitize_file_name(value.trim_matches('"'));
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    })
}

/// Keep only the final path component so a report cannot escape its directory
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.')
        .to_string()
}
