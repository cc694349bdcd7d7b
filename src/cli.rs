//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "copilot-interview",
    version,
    about = "Take an AI-led interview from your terminal"
)]
pub struct Cli {
    /// Settings file (defaults to $COPILOT_CONFIG or ./copilot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start an interview (default)
    Run {
        /// Candidate name; prompted for when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// List archived interviews
    History,
    /// Print an archived transcript
    Show { session_id: String },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run { name: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["copilot-interview"]).unwrap();
        assert_eq!(cli.command(), Command::Run { name: None });
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_run_with_name_and_config() {
        let cli = Cli::try_parse_from([
            "copilot-interview",
            "run",
            "--name",
            "Alice",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(
            cli.command(),
            Command::Run {
                name: Some("Alice".into())
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_show_requires_session_id() {
        assert!(Cli::try_parse_from(["copilot-interview", "show"]).is_err());

        let cli = Cli::try_parse_from(["copilot-interview", "show", "s1"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Show {
                session_id: "s1".into()
            }
        );
    }
}
