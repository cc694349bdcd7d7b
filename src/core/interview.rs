//! Interview runtime
//!
//! Runs the requests produced by the [`SessionController`] against the
//! interview service, feeds the results back, and keeps the speech capture
//! and the transcript archive in step with the controller state.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;

use crate::api::{ApiError, InterviewApi};
use crate::dictation::{DictationCommand, DictationEvent, SpeechCapability};
use crate::session::{Notice, SessionController, SessionError};

use super::archive::TranscriptArchive;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error(transparent)]
    Rejected(#[from] SessionError),

    #[error("{} ({})", .0.message, .0.detail)]
    Start(Notice),

    #[error("Report export failed: {0}")]
    Export(#[from] ApiError),
}

/// Clears the controller's in-flight flag when dropped, so an abandoned
/// call never leaves the session stuck.
struct PendingGuard<'a> {
    controller: &'a mut SessionController,
}

impl<'a> PendingGuard<'a> {
    fn new(controller: &'a mut SessionController) -> Self {
        Self { controller }
    }
}

impl Deref for PendingGuard<'_> {
    type Target = SessionController;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl DerefMut for PendingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.controller.clear_pending();
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout(limit)),
    }
}

pub struct Interview {
    api: Arc<dyn InterviewApi>,
    controller: SessionController,
    timeout: Duration,
    reports_dir: PathBuf,
    speech: Option<Arc<dyn SpeechCapability>>,
    capture: Option<BoxStream<'static, DictationEvent>>,
    archive: Option<Arc<TranscriptArchive>>,
}

impl Interview {
    pub fn new(api: Arc<dyn InterviewApi>, timeout: Duration, reports_dir: PathBuf) -> Self {
        Self {
            api,
            controller: SessionController::new(false),
            timeout,
            reports_dir,
            speech: None,
            capture: None,
            archive: None,
        }
    }

    /// Enable dictation through the given speech capability
    pub fn with_speech(mut self, speech: Arc<dyn SpeechCapability>) -> Self {
        self.speech = Some(speech);
        self.controller = SessionController::new(true);
        self
    }

    /// Archive the transcript after every exchange
    pub fn with_archive(mut self, archive: Arc<TranscriptArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn set_draft_input(&mut self, text: impl Into<String>) {
        self.controller.set_draft_input(text);
    }

    pub async fn begin(&mut self, candidate_name: &str) -> Result<(), InterviewError> {
        let request = self.controller.begin(candidate_name)?;

        let resolved = {
            let mut guard = PendingGuard::new(&mut self.controller);
            let result =
                with_timeout(self.timeout, self.api.start_interview(&request.candidate_name))
                    .await;
            guard.resolve_begin(&request, result)
        };

        resolved.map_err(InterviewError::Start)?;
        self.archive_snapshot().await;
        Ok(())
    }

    pub async fn answer(&mut self, text: &str) -> Result<(), InterviewError> {
        let request = self.controller.answer(text)?;
        if request.dictation == Some(DictationCommand::StopCapture) {
            self.capture = None;
        }

        {
            let mut guard = PendingGuard::new(&mut self.controller);
            let result = with_timeout(
                self.timeout,
                self.api.submit_answer(&request.session_id, &request.text),
            )
            .await;
            guard.resolve_answer(result);
        }

        self.archive_snapshot().await;
        Ok(())
    }

    /// Download the report and save it under the reports directory
    pub async fn export(&self) -> Result<PathBuf, InterviewError> {
        let session_id = self.controller.export_session()?;
        let report = self.api.export_report(session_id).await?;
        let path = report.save_to(&self.reports_dir).await?;
        tracing::info!(path = %path.display(), "report saved");
        Ok(path)
    }

    pub async fn toggle_dictation(&mut self) -> Result<(), InterviewError> {
        match self.controller.toggle_dictation()? {
            Some(DictationCommand::StartCapture) => self.start_capture().await,
            Some(DictationCommand::StopCapture) => self.capture = None,
            None => {}
        }
        Ok(())
    }

    async fn start_capture(&mut self) {
        let Some(speech) = self.speech.clone() else {
            self.controller
                .dictation_event(DictationEvent::Error("no speech capability".into()));
            return;
        };

        match speech.listen().await {
            Ok(stream) => self.capture = Some(stream),
            Err(e) => {
                self.controller
                    .dictation_event(DictationEvent::Error(e.to_string()));
            }
        }
    }

    /// Wait for the next event from an active capture.
    /// Never resolves while dictation is idle.
    pub async fn next_dictation_event(&mut self) -> DictationEvent {
        match self.capture.as_mut() {
            Some(stream) => stream.next().await.unwrap_or(DictationEvent::End),
            None => std::future::pending().await,
        }
    }

    pub fn apply_dictation_event(&mut self, event: DictationEvent) {
        self.controller.dictation_event(event);
        if !self.controller.is_dictation_active() {
            self.capture = None;
        }
    }

    async fn archive_snapshot(&self) {
        let (Some(archive), Some(session_id)) = (&self.archive, self.controller.session_id())
        else {
            return;
        };

        if let Err(e) = archive
            .save_transcript(
                session_id,
                self.controller.candidate_name(),
                self.controller.transcript(),
                self.controller.is_completed(),
            )
            .await
        {
            tracing::warn!(error = %e, "failed to archive transcript");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AnswerResponse, FeedbackPayload, InitialAction, QuestionPayload, ReportFile,
        StartResponse,
    };
    use crate::dictation::SpeechError;
    use crate::session::{Sender, ANSWER_ERROR_TEXT};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answer responses in order
    #[derive(Default)]
    struct ScriptedApi {
        start: Mutex<Option<Result<StartResponse, ApiError>>>,
        answers: Mutex<VecDeque<Result<AnswerResponse, ApiError>>>,
        submitted: Mutex<Vec<(String, String)>>,
        hang: bool,
    }

    impl ScriptedApi {
        fn new() -> Self {
            let api = Self::default();
            *api.start.lock().unwrap() = Some(Ok(StartResponse {
                session_id: Some("s1".into()),
                initial_action: Some(InitialAction {
                    question: Some(QuestionPayload {
                        text: "Tell me about yourself".into(),
                        round: "Warmup".into(),
                    }),
                }),
            }));
            api
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::new()
            }
        }

        fn then(self, response: Result<AnswerResponse, ApiError>) -> Self {
            self.answers.lock().unwrap().push_back(response);
            self
        }
    }

    #[async_trait]
    impl InterviewApi for ScriptedApi {
        async fn start_interview(&self, _candidate_name: &str) -> Result<StartResponse, ApiError> {
            let scripted = self.start.lock().unwrap().take();
            scripted.unwrap_or_else(|| Err(ApiError::Malformed("no start scripted".into())))
        }

        async fn submit_answer(
            &self,
            session_id: &str,
            text: &str,
        ) -> Result<AnswerResponse, ApiError> {
            self.submitted
                .lock()
                .unwrap()
                .push((session_id.to_string(), text.to_string()));
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let next = self.answers.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(ApiError::Malformed("script exhausted".into())))
        }

        async fn export_report(&self, session_id: &str) -> Result<ReportFile, ApiError> {
            Ok(ReportFile {
                file_name: format!("report_{}.pdf", session_id),
                bytes: b"%PDF".to_vec(),
            })
        }
    }

    /// Speech capability that replays a fixed event list
    struct ScriptedSpeech(Vec<DictationEvent>);

    #[async_trait]
    impl SpeechCapability for ScriptedSpeech {
        async fn listen(&self) -> Result<BoxStream<'static, DictationEvent>, SpeechError> {
            Ok(futures::stream::iter(self.0.clone()).boxed())
        }
    }

    fn interview(api: ScriptedApi) -> Interview {
        Interview::new(
            Arc::new(api),
            Duration::from_secs(5),
            std::env::temp_dir().join(format!("copilot-reports-{}", uuid::Uuid::new_v4())),
        )
    }

    fn feedback_and_question() -> Result<AnswerResponse, ApiError> {
        Ok(AnswerResponse {
            feedback: Some(FeedbackPayload {
                score: 4.0,
                feedback: "Good clarity".into(),
            }),
            status: Some("in_progress".into()),
            question: Some(QuestionPayload {
                text: "Explain CAP theorem".into(),
                round: "Technical".into(),
            }),
            ..Default::default()
        })
    }

    fn completed() -> Result<AnswerResponse, ApiError> {
        Ok(AnswerResponse {
            status: Some("completed".into()),
            message: Some("Thank you, interview finished.".into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_full_interview() {
        let mut interview = interview(ScriptedApi::new().then(feedback_and_question()).then(completed()));

        interview.begin("Alice").await.unwrap();
        assert_eq!(
            interview.controller().active_message().unwrap().round.as_deref(),
            Some("Warmup")
        );

        interview.answer("I build backend systems").await.unwrap();
        let active = interview.controller().active_message().unwrap();
        assert_eq!(active.text, "Explain CAP theorem");
        assert_eq!(interview.controller().transcript().len(), 4);

        assert!(matches!(
            interview.export().await,
            Err(InterviewError::Rejected(SessionError::NotCompleted))
        ));

        interview.answer("Consistency, availability, partitions").await.unwrap();
        assert!(interview.controller().is_completed());
        assert_eq!(
            interview.controller().transcript().last().unwrap().text,
            "Thank you, interview finished."
        );

        let path = interview.export().await.unwrap();
        assert_eq!(path.file_name().unwrap(), "report_s1.pdf");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_begin_malformed_surfaces_notice() {
        let api = ScriptedApi::new();
        *api.start.lock().unwrap() = Some(Ok(StartResponse::default()));
        let mut interview = interview(api);

        let err = interview.begin("Alice").await.unwrap_err();
        assert!(matches!(err, InterviewError::Start(_)));
        assert!(interview.controller().session_id().is_none());
        assert!(!interview.controller().is_pending());
    }

    #[tokio::test]
    async fn test_answer_timeout_is_failure() {
        let mut interview = Interview::new(
            Arc::new(ScriptedApi::hanging()),
            Duration::from_millis(50),
            std::env::temp_dir(),
        );
        interview.begin("Alice").await.unwrap();
        interview.answer("hello").await.unwrap();

        let controller = interview.controller();
        assert!(!controller.is_pending());
        assert_eq!(controller.transcript().last().unwrap().text, ANSWER_ERROR_TEXT);
        assert_eq!(controller.transcript().last().unwrap().sender, Sender::Bot);
    }

    #[tokio::test]
    async fn test_abandoned_answer_clears_pending() {
        let mut interview = interview(ScriptedApi::hanging());
        interview.begin("Alice").await.unwrap();

        {
            let mut call = tokio_test::task::spawn(interview.answer("hello"));
            tokio_test::assert_pending!(call.poll());
        }

        assert!(!interview.controller().is_pending());
        // The optimistic user message stays
        assert_eq!(
            interview.controller().transcript().last().unwrap().sender,
            Sender::User
        );
    }

    #[tokio::test]
    async fn test_rejected_answer_makes_no_call() {
        let api = Arc::new(ScriptedApi::new());
        let mut interview = Interview::new(api.clone(), Duration::from_secs(5), std::env::temp_dir());
        interview.begin("Alice").await.unwrap();

        assert!(matches!(
            interview.answer("   ").await,
            Err(InterviewError::Rejected(SessionError::EmptyInput))
        ));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dictation_flow() {
        let speech = ScriptedSpeech(vec![
            DictationEvent::Result {
                segments: vec!["I build".into()],
                is_final: false,
            },
            DictationEvent::Result {
                segments: vec!["I build backend systems".into()],
                is_final: true,
            },
        ]);
        let mut interview =
            interview(ScriptedApi::new().then(feedback_and_question())).with_speech(Arc::new(speech));
        interview.begin("Alice").await.unwrap();

        interview.toggle_dictation().await.unwrap();
        assert!(interview.controller().is_dictation_active());

        for _ in 0..2 {
            let event = interview.next_dictation_event().await;
            interview.apply_dictation_event(event);
        }
        assert_eq!(interview.controller().draft_input(), "I build backend systems");

        // Stream exhausted: end of speech
        let event = interview.next_dictation_event().await;
        assert_eq!(event, DictationEvent::End);
        interview.apply_dictation_event(event);
        assert!(!interview.controller().is_dictation_active());

        let draft = interview.controller().draft_input().to_string();
        interview.answer(&draft).await.unwrap();
        assert!(interview.controller().draft_input().is_empty());
    }

    #[tokio::test]
    async fn test_dictation_without_capability() {
        let mut interview = interview(ScriptedApi::new());
        interview.begin("Alice").await.unwrap();
        assert!(matches!(
            interview.toggle_dictation().await,
            Err(InterviewError::Rejected(SessionError::DictationUnavailable))
        ));
    }

    #[tokio::test]
    async fn test_archive_follows_transcript() {
        let archive = Arc::new(TranscriptArchive::in_memory().await.unwrap());
        let mut interview = interview(ScriptedApi::new().then(completed())).with_archive(archive.clone());

        interview.begin("Alice").await.unwrap();
        interview.answer("done").await.unwrap();

        let stored = archive.get_transcript("s1").await.unwrap();
        assert_eq!(stored.messages(), interview.controller().transcript().messages());

        let sessions = archive.list_sessions().await.unwrap();
        assert_eq!(sessions[0].candidate.as_deref(), Some("Alice"));
        assert!(sessions[0].completed);
    }
}
