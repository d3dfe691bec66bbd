use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::clients::{
    JobOptions, JobPhase, SessionError, TranscriptFormat, TranscriptionProvider,
    TranscriptionSession,
};
use crate::config::BatchConfiguration;
use crate::media::SourceFile;

use super::artifacts::TranscriptArtifacts;
use super::converter::MediaConverter;
use super::error::PipelineError;
use super::events::PREPARING;
use super::observer::EventSink;

/// Default wait between status queries
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Consecutive failed status queries after which a job is abandoned
pub const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 3;

/// How a runner waits on the remote job.
///
/// There is no deadline: a job reporting intermediate phases is polled
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_consecutive_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_consecutive_failures: MAX_CONSECUTIVE_POLL_FAILURES,
        }
    }
}

/// End-to-end pipeline for one file.
///
/// Runs synchronously on the calling thread and reports only through its
/// [`EventSink`]. Steps are strictly sequential:
/// convert -> submit -> poll until terminal -> fetch -> write -> Completed.
pub struct JobRunner {
    source: SourceFile,
    config: Arc<BatchConfiguration>,
    converter: Arc<dyn MediaConverter>,
    provider: Arc<dyn TranscriptionProvider>,
    policy: PollPolicy,
}

impl JobRunner {
    pub fn new(
        source: SourceFile,
        config: Arc<BatchConfiguration>,
        converter: Arc<dyn MediaConverter>,
        provider: Arc<dyn TranscriptionProvider>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            source,
            config,
            converter,
            provider,
            policy,
        }
    }

    /// Run the pipeline, ending with exactly one terminal event.
    pub fn run(self, sink: EventSink) {
        let name = self.source.display_name();
        let slot = sink.slot().index;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&sink)))
            .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(payload))));

        match outcome {
            Ok(artifacts) => {
                info!("[{}:{}] Completed", slot, name);
                sink.completed(artifacts.txt, artifacts.srt);
            }
            Err(e) => {
                error!("[{}:{}] Failed: {}", slot, name, e);
                sink.failed(e.user_message());
            }
        }
    }

    fn execute(&self, sink: &EventSink) -> Result<TranscriptArtifacts, PipelineError> {
        sink.status(PREPARING);

        let media = self
            .converter
            .convert(self.source.path(), self.config.intermediate_format.into())?;

        let options = JobOptions::from(self.config.as_ref());
        let mut session = TranscriptionSession::submit(self.provider.as_ref(), &media, &options)?;

        if self.poll_until_terminal(&mut session, sink)? == JobPhase::Failed {
            return Err(SessionError::Server.into());
        }

        let txt = session.fetch_artifact(TranscriptFormat::Text)?;
        let srt = session.fetch_artifact(TranscriptFormat::Srt)?;

        let artifacts = TranscriptArtifacts::for_media(&media);
        artifacts.write(&txt, &srt)?;
        Ok(artifacts)
    }

    /// Poll at a fixed interval until the job is done or failed.
    ///
    /// Blocks the current thread for the whole wait.
    fn poll_until_terminal(
        &self,
        session: &mut TranscriptionSession<'_>,
        sink: &EventSink,
    ) -> Result<JobPhase, PipelineError> {
        let mut consecutive_failures = 0;

        loop {
            match session.poll_once() {
                Ok(report) => {
                    consecutive_failures = 0;
                    sink.status(report.label);
                    sink.progress(report.percent);
                    if report.phase.is_terminal() {
                        return Ok(report.phase);
                    }
                }
                Err(SessionError::Transport(msg)) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= self.policy.max_consecutive_failures {
                        return Err(SessionError::Transport(msg).into());
                    }
                    warn!(
                        "Job {}: status query failed ({}/{}): {}",
                        session.job_id(),
                        consecutive_failures,
                        self.policy.max_consecutive_failures,
                        msg
                    );
                }
                Err(e) => return Err(e.into()),
            }

            thread::sleep(self.policy.interval);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}
