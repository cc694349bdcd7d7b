//! CoPilot - AI interview terminal client
//!
//! Connects to the interview service, walks the candidate through each
//! question (typed or dictated), and downloads the final report.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod config;
mod core;
mod dictation;
mod session;
mod terminal;

use api::http::HttpApiConfig;
use api::HttpInterviewApi;
use cli::{Cli, Command};
use config::Config;
use crate::core::{Interview, TranscriptArchive};
use dictation::CommandSpeech;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "copilot_interview=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command() {
        Command::Run { name } => run_interview(config, name).await,
        Command::History => {
            let archive = TranscriptArchive::open(&config.archive_path()).await?;
            let sessions = archive.list_sessions().await?;
            print!("{}", terminal::render::history(&sessions));
            Ok(())
        }
        Command::Show { session_id } => {
            let archive = TranscriptArchive::open(&config.archive_path()).await?;
            let transcript = archive.get_transcript(&session_id).await?;
            if transcript.is_empty() {
                anyhow::bail!("No archived interview with id {}", session_id);
            }
            print!("{}", terminal::render::transcript(&transcript));
            if let Some(summary) = terminal::render::score_summary(&transcript) {
                println!("{}", summary);
            }
            Ok(())
        }
    }
}

async fn run_interview(config: Config, name: Option<String>) -> anyhow::Result<()> {
    let api = HttpInterviewApi::new(HttpApiConfig {
        base_url: config.api_url.clone(),
        timeout: config.request_timeout,
    })?;

    match api.ping().await {
        Ok(greeting) => tracing::info!(url = %config.api_url, %greeting, "interview service reachable"),
        Err(e) => tracing::warn!(url = %config.api_url, error = %e, "interview service health check failed"),
    }

    let mut interview = Interview::new(
        Arc::new(api),
        config.request_timeout,
        config.reports_dir.clone(),
    );

    if let Some(speech) = config
        .dictation_command
        .as_deref()
        .and_then(CommandSpeech::new)
    {
        tracing::info!("dictation enabled");
        interview = interview.with_speech(Arc::new(speech));
    }

    if config.archive_enabled {
        match TranscriptArchive::open(&config.archive_path()).await {
            Ok(archive) => interview = interview.with_archive(Arc::new(archive)),
            Err(e) => tracing::warn!(error = %e, "transcript archive unavailable"),
        }
    }

    terminal::run(interview, name).await
}
