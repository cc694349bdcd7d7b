//! Speech capability backed by an external transcriber process
//!
//! The transcriber prints its current best hypothesis on stdout, one line at
//! a time. Exiting with success signals end of speech.
//!
//! ```toml
//! [dictation]
//! command = ["whisper-stream", "--model", "base.en"]
//! ```

use std::process::Stdio;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::{DictationEvent, SpeechCapability, SpeechError};

#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    /// Returns `None` for an empty command line.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechCapability for CommandSpeech {
    async fn listen(&self) -> Result<BoxStream<'static, DictationEvent>, SpeechError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "transcriber has no stdout")
        })?;

        tracing::debug!(program = %self.program, "transcriber started");

        let stream = async_stream::stream! {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        yield DictationEvent::Result {
                            segments: vec![text.to_string()],
                            is_final: false,
                        };
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield DictationEvent::Error(e.to_string());
                        return;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => yield DictationEvent::End,
                Ok(status) => yield DictationEvent::Error(format!("transcriber exited with {}", status)),
                Err(e) => yield DictationEvent::Error(e.to_string()),
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn command(parts: &[&str]) -> CommandSpeech {
        let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
        CommandSpeech::new(&parts).unwrap()
    }

    #[test]
    fn test_empty_command() {
        assert!(CommandSpeech::new(&[]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lines_become_results() {
        let speech = command(&["sh", "-c", "echo hello; echo; echo 'hello world'"]);
        let events: Vec<DictationEvent> = speech.listen().await.unwrap().collect().await;

        assert_eq!(
            events,
            vec![
                DictationEvent::Result {
                    segments: vec!["hello".into()],
                    is_final: false
                },
                DictationEvent::Result {
                    segments: vec!["hello world".into()],
                    is_final: false
                },
                DictationEvent::End,
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_is_error() {
        let speech = command(&["sh", "-c", "exit 3"]);
        let events: Vec<DictationEvent> = speech.listen().await.unwrap().collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DictationEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let speech = command(&["definitely-not-a-transcriber-binary"]);
        assert!(matches!(speech.listen().await, Err(SpeechError::Spawn(_))));
    }
}
