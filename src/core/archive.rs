//! Transcript archive using SQLite
//!
//! Keeps a local copy of every interview so it can be reviewed after the
//! service has forgotten it.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::session::{Feedback, Message, Sender, Transcript};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt archive row: {0}")]
    Corrupt(String),
}

/// One archived interview
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub candidate: Option<String>,
    pub completed: bool,
    pub updated_at: String,
    pub message_count: i64,
    pub average_score: Option<f64>,
}

type MessageRow = (
    String,
    String,
    String,
    Option<String>,
    Option<f64>,
    Option<String>,
    String,
);

pub struct TranscriptArchive {
    pool: SqlitePool,
}

impl TranscriptArchive {
    /// Open (or create) the archive at the given SQLite database path
    pub async fn open(db_path: &Path) -> Result<Self, ArchiveError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let archive = Self { pool };
        archive.init_schema().await?;
        Ok(archive)
    }

    /// Create an in-memory archive
    pub async fn in_memory() -> Result<Self, ArchiveError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let archive = Self { pool };
        archive.init_schema().await?;
        Ok(archive)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                candidate TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                round TEXT,
                score REAL,
                feedback TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_session
            ON messages(session_id, position)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store the session and any messages not archived yet.
    /// Messages are immutable, so already stored ids are skipped.
    pub async fn save_transcript(
        &self,
        session_id: &str,
        candidate: Option<&str>,
        transcript: &Transcript,
        completed: bool,
    ) -> Result<(), ArchiveError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, candidate, completed) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                candidate = COALESCE(excluded.candidate, sessions.candidate),
                completed = excluded.completed,
                updated_at = datetime('now')
            "#,
        )
        .bind(session_id)
        .bind(candidate)
        .bind(completed)
        .execute(&mut *tx)
        .await?;

        for (position, message) in transcript.messages().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO messages
                    (id, session_id, position, sender, text, round, score, feedback, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(message.id.to_string())
            .bind(session_id)
            .bind(position as i64)
            .bind(message.sender.as_str())
            .bind(&message.text)
            .bind(message.round.as_deref())
            .bind(message.feedback.as_ref().map(|f| f.score))
            .bind(message.feedback.as_ref().map(|f| f.feedback.as_str()))
            .bind(message.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load an archived transcript in its original order
    pub async fn get_transcript(&self, session_id: &str) -> Result<Transcript, ArchiveError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, sender, text, round, score, feedback, created_at
            FROM messages
            WHERE session_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let messages = rows
            .into_iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Transcript::from_messages(messages))
    }

    /// All archived sessions, most recently updated first
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ArchiveError> {
        let rows: Vec<(String, Option<String>, bool, String, i64, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT s.id, s.candidate, s.completed, s.updated_at, COUNT(m.id), AVG(m.score)
            FROM sessions s
            LEFT JOIN messages m ON m.session_id = s.id
            GROUP BY s.id
            ORDER BY s.updated_at DESC, s.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(session_id, candidate, completed, updated_at, message_count, average_score)| {
                    SessionSummary {
                        session_id,
                        candidate,
                        completed,
                        updated_at,
                        message_count,
                        average_score,
                    }
                },
            )
            .collect())
    }
}

fn message_from_row(row: MessageRow) -> Result<Message, ArchiveError> {
    let (id, sender, text, round, score, feedback, created_at) = row;

    let id = Uuid::parse_str(&id).map_err(|e| ArchiveError::Corrupt(format!("id {}: {}", id, e)))?;
    let sender = Sender::parse(&sender)
        .ok_or_else(|| ArchiveError::Corrupt(format!("sender {}", sender)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ArchiveError::Corrupt(format!("created_at {}: {}", created_at, e)))?;

    let feedback = match (score, feedback) {
        (Some(score), Some(feedback)) => Some(Feedback { score, feedback }),
        _ => None,
    };

    Ok(Message {
        id,
        sender,
        text,
        round,
        feedback,
        created_at,
    })
}
