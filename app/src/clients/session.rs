//! One remote transcription job: submit, poll, fetch.

use std::path::Path;

use log::{debug, info};

use super::client::{JobId, JobOptions, TranscriptFormat, TranscriptionProvider};
use super::error::SessionError;
use super::state_manager::{JobEvent, JobPhase, JobStateMachine, TransitionResult};

/// Outcome of a single status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Local phase after applying the provider's answer
    pub phase: JobPhase,
    /// Provider phase as display text, e.g. "Running"
    pub label: String,
    /// Progress in 0..=100
    pub percent: u8,
}

/// Holds one job handle and its phase; nothing else survives between calls.
pub struct TranscriptionSession<'a> {
    provider: &'a dyn TranscriptionProvider,
    job_id: JobId,
    machine: JobStateMachine,
}

impl<'a> TranscriptionSession<'a> {
    /// Upload `media` and start a job. The session starts out polling.
    pub fn submit(
        provider: &'a dyn TranscriptionProvider,
        media: &Path,
        options: &JobOptions,
    ) -> Result<Self, SessionError> {
        let job_id = provider.submit_job(media, options)?;
        info!("Submitted {:?} as job {}", media, job_id);

        let mut machine = JobStateMachine::new();
        machine.transition(JobEvent::Accepted)?;

        Ok(Self {
            provider,
            job_id,
            machine,
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn phase(&self) -> JobPhase {
        self.machine.current()
    }

    /// Query the provider once and advance the phase.
    pub fn poll_once(&mut self) -> Result<PollReport, SessionError> {
        let status = self.provider.job_status(&self.job_id)?;
        let event = JobEvent::from_provider_phase(&status.phase);

        if let TransitionResult::Changed { from, to } = self.machine.transition(event)? {
            debug!("Job {}: {} -> {}", self.job_id, from, to);
        }

        Ok(PollReport {
            phase: self.machine.current(),
            label: phase_label(&status.phase),
            percent: progress_percent(status.progress),
        })
    }

    /// Download the transcript in `format`. Only valid once completed.
    pub fn fetch_artifact(&self, format: TranscriptFormat) -> Result<String, SessionError> {
        let phase = self.phase();
        if phase != JobPhase::Completed {
            return Err(SessionError::Fetch(format!(
                "job {} is {}, not completed",
                self.job_id, phase
            )));
        }

        self.provider.transcript(&self.job_id, format)
    }
}

/// Provider phase with its first letter upper-cased: "running" -> "Running".
pub fn phase_label(phase: &str) -> String {
    let phase = phase.trim().to_lowercase();
    let mut chars = phase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Completion fraction to a whole percentage, clamped to 0..=100.
pub fn progress_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).floor().clamp(0.0, 100.0) as u8
}
