//! Dictation state machine and speech capability seam
//!
//! The state machine is driven by [`DictationEvent`]s and never talks to a
//! speech engine directly. It returns [`DictationCommand`]s that the runtime
//! carries out against whatever [`SpeechCapability`] is configured.

pub mod command;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub use command::CommandSpeech;

#[derive(Debug, Clone, PartialEq)]
pub enum DictationEvent {
    /// User toggled dictation on
    Start,
    /// User toggled dictation off
    Stop,
    /// A partial or final transcription; `segments` is everything the
    /// capability currently reports
    Result { segments: Vec<String>, is_final: bool },
    /// End-of-speech signal from the capability
    End,
    /// Error signal from the capability
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
}

/// Instructions for the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationCommand {
    StartCapture,
    StopCapture,
}

#[derive(Debug, Clone)]
pub struct Dictation {
    available: bool,
    state: DictationState,
}

impl Dictation {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            state: DictationState::Idle,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    /// Apply an event. Transcription results overwrite `draft` in full.
    pub fn handle(&mut self, event: DictationEvent, draft: &mut String) -> Option<DictationCommand> {
        match (self.state, event) {
            (DictationState::Idle, DictationEvent::Start) => {
                if !self.available {
                    return None;
                }
                draft.clear();
                self.state = DictationState::Listening;
                tracing::debug!("dictation listening");
                Some(DictationCommand::StartCapture)
            }
            (DictationState::Listening, DictationEvent::Stop) => {
                self.state = DictationState::Idle;
                tracing::debug!("dictation stopped by user");
                Some(DictationCommand::StopCapture)
            }
            (DictationState::Listening, DictationEvent::Result { segments, is_final }) => {
                *draft = segments.concat();
                tracing::trace!(is_final, "dictation result");
                None
            }
            (DictationState::Listening, DictationEvent::End) => {
                self.state = DictationState::Idle;
                tracing::debug!("dictation ended");
                None
            }
            (DictationState::Listening, DictationEvent::Error(reason)) => {
                tracing::warn!(%reason, "speech recognition error");
                self.state = DictationState::Idle;
                None
            }
            (_, DictationEvent::Error(reason)) => {
                tracing::warn!(%reason, "speech recognition error while idle");
                None
            }
            // Stale results, repeated toggles and late end signals
            _ => None,
        }
    }

    /// Drop back to idle without waiting for the capability.
    /// Returns the command needed to release it, if it was listening.
    pub fn reset(&mut self) -> Option<DictationCommand> {
        if self.is_listening() {
            self.state = DictationState::Idle;
            Some(DictationCommand::StopCapture)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to start speech capture: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A platform speech-to-text engine.
///
/// `listen` starts one recognition session and yields its events.
/// Dropping the stream stops recognition.
#[async_trait]
pub trait SpeechCapability: Send + Sync {
    async fn listen(&self) -> Result<BoxStream<'static, DictationEvent>, SpeechError>;
}
