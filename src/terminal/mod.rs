//! Line-oriented terminal front-end
//!
//! Reads commands from stdin and dictation events from the active capture
//! on one event loop, and re-renders the active question after every change.

pub mod render;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::{Interview, InterviewError};

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Answer(String),
    SubmitDraft,
    ToggleDictation,
    Export,
    Transcript,
    Help,
    Quit,
    Unknown(String),
}

impl InputAction {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => InputAction::SubmitDraft,
            "/dictate" | "/mic" => InputAction::ToggleDictation,
            "/export" => InputAction::Export,
            "/transcript" => InputAction::Transcript,
            "/help" => InputAction::Help,
            "/quit" | "/exit" => InputAction::Quit,
            command if command.starts_with('/') => InputAction::Unknown(command.to_string()),
            _ => InputAction::Answer(line.to_string()),
        }
    }
}

fn stdin_lines() -> BoxStream<'static, std::io::Result<String>> {
    Box::pin(async_stream::try_stream! {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            yield line;
        }
    })
}

fn report(error: InterviewError) {
    match error {
        InterviewError::Rejected(reason) => println!("! {}", reason),
        other => eprintln!("⚠ {}", other),
    }
}

/// Run an interview until the user quits or stdin closes
pub async fn run(mut interview: Interview, candidate_name: Option<String>) -> anyhow::Result<()> {
    let mut input = stdin_lines();

    println!("{}", render::banner());

    let mut candidate_name = candidate_name;
    while !interview.controller().is_started() {
        let name = match candidate_name.take() {
            Some(name) => name,
            None => {
                println!("Candidate ID - enter your name:");
                match input.next().await {
                    Some(line) => line?,
                    None => return Ok(()),
                }
            }
        };

        if let Err(e) = interview.begin(&name).await {
            report(e);
        }
    }

    print!("{}", render::active(interview.controller()));
    println!("{}", render::status_line(interview.controller()));

    loop {
        tokio::select! {
            line = input.next() => {
                let Some(line) = line else { break };
                let action = InputAction::parse(&line?);

                match action {
                    InputAction::Quit => break,
                    InputAction::Help => {
                        print!("{}", render::help());
                        continue;
                    }
                    InputAction::Transcript => {
                        print!("{}", render::transcript(interview.controller().transcript()));
                        continue;
                    }
                    InputAction::Unknown(command) => {
                        println!("! Unknown command {}. /help for commands.", command);
                        continue;
                    }
                    InputAction::Export => match interview.export().await {
                        Ok(path) => println!("Report saved to {}", path.display()),
                        Err(e) => report(e),
                    },
                    InputAction::ToggleDictation => {
                        if let Err(e) = interview.toggle_dictation().await {
                            report(e);
                        }
                    }
                    InputAction::SubmitDraft => {
                        let draft = interview.controller().draft_input().to_string();
                        if let Err(e) = interview.answer(&draft).await {
                            report(e);
                        }
                    }
                    InputAction::Answer(text) => {
                        interview.set_draft_input(text.as_str());
                        if let Err(e) = interview.answer(&text).await {
                            report(e);
                        }
                    }
                }

                let controller = interview.controller();
                print!("{}", render::active(controller));
                if controller.is_completed() {
                    if let Some(summary) = render::score_summary(controller.transcript()) {
                        println!("{}", summary);
                    }
                }
                println!("{}", render::status_line(controller));
            }
            event = interview.next_dictation_event() => {
                interview.apply_dictation_event(event);
                let controller = interview.controller();
                println!("> {}", controller.draft_input());
                if !controller.is_dictation_active() {
                    println!("{}", render::status_line(controller));
                }
            }
        }
    }

    Ok(())
}
