//! Core interview components
//!
//! This module contains the runtime that drives a session against the
//! interview service, and the local transcript archive.

mod archive;
mod interview;

pub use archive::{SessionSummary, TranscriptArchive};
pub use interview::{Interview, InterviewError};
