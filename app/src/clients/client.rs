use std::path::Path;

use crate::config::{BatchConfiguration, OperatingPoint};

use super::error::SessionError;

/// Provider-assigned job handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-job transcription settings sent with the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOptions {
    pub language: String,
    pub operating_point: OperatingPoint,
}

impl From<&BatchConfiguration> for JobOptions {
    fn from(config: &BatchConfiguration) -> Self {
        Self {
            language: config.language.clone(),
            operating_point: config.operating_point,
        }
    }
}

/// Raw job status as reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    /// Provider phase name, e.g. "queued", "running", "done"
    pub phase: String,
    /// Completion fraction in 0..=1
    pub progress: f64,
}

/// Transcript renderings the provider can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TranscriptFormat {
    #[strum(serialize = "txt")]
    Text,
    Srt,
}

impl TranscriptFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TranscriptFormat::Text => "txt",
            TranscriptFormat::Srt => "srt",
        }
    }
}

/// Trait for job-oriented transcription providers
///
/// Each implementation knows how to:
/// - Upload media and create a job
/// - Report a job's current phase and progress
/// - Render a finished job's transcript in a given format
///
/// Calls block; they are made from worker threads.
pub trait TranscriptionProvider: Send + Sync {
    /// Upload `media` and create a job for it
    fn submit_job(&self, media: &Path, options: &JobOptions) -> Result<JobId, SessionError>;

    /// Fetch the job's current status
    fn job_status(&self, job: &JobId) -> Result<ProviderStatus, SessionError>;

    /// Download the transcript of a finished job
    fn transcript(&self, job: &JobId, format: TranscriptFormat) -> Result<String, SessionError>;
}
