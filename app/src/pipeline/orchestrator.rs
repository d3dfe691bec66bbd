use std::sync::Arc;

use log::{error, info, warn};
use speechbatch_transcoder::Transcoder;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::clients::{ApiConfig, SpeechmaticsClient, TranscriptionProvider};
use crate::config::BatchConfiguration;
use crate::media::SourceFile;
use crate::BATCH_CAP;

use super::converter::MediaConverter;
use super::events::FileSlot;
use super::observer::{EventSink, JobObserver};
use super::runner::{JobRunner, PollPolicy};

/// Runs one [`JobRunner`] per file on a worker pool of [`BATCH_CAP`] slots.
///
/// Each runner holds its worker for its whole life, including the poll
/// loop. Must be used from within a Tokio runtime.
pub struct Orchestrator {
    config: Arc<BatchConfiguration>,
    converter: Arc<dyn MediaConverter>,
    provider: Arc<dyn TranscriptionProvider>,
    policy: PollPolicy,
    workers: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<BatchConfiguration>,
        converter: Arc<dyn MediaConverter>,
        provider: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        Self {
            config,
            converter,
            provider,
            policy: PollPolicy::default(),
            workers: Arc::new(Semaphore::new(BATCH_CAP)),
        }
    }

    /// Wire up ffmpeg and the Speechmatics client from `config`.
    ///
    /// Build and drop outside the async runtime; the HTTP client blocks.
    pub fn from_config(config: Arc<BatchConfiguration>) -> reqwest::Result<Self> {
        let converter = Arc::new(Transcoder::new(config.ffmpeg_path.clone()));
        let provider = Arc::new(SpeechmaticsClient::new(ApiConfig::from(config.as_ref()))?);
        Ok(Self::new(config, converter, provider))
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Schedule every accepted file and return without waiting.
    ///
    /// Files past [`BATCH_CAP`] are not scheduled; they are returned in
    /// [`BatchHandle::rejected`]. Each file's events go to `observer`
    /// tagged with that file's slot only.
    pub fn run_batch(
        &self,
        mut sources: Vec<SourceFile>,
        observer: Arc<dyn JobObserver>,
    ) -> BatchHandle {
        let rejected = if sources.len() > BATCH_CAP {
            let excess = sources.split_off(BATCH_CAP);
            warn!(
                "Batch of {} files exceeds the cap of {}; not scheduling {} file(s)",
                BATCH_CAP + excess.len(),
                BATCH_CAP,
                excess.len()
            );
            excess
        } else {
            Vec::new()
        };

        info!("Scheduling {} file(s)", sources.len());

        let tasks = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| {
                let slot = FileSlot {
                    index,
                    source: source.path().to_path_buf(),
                };
                let sink = EventSink::new(slot, observer.clone());
                let runner = JobRunner::new(
                    source,
                    self.config.clone(),
                    self.converter.clone(),
                    self.provider.clone(),
                    self.policy,
                );
                tokio::spawn(run_on_worker(self.workers.clone(), runner, sink))
            })
            .collect();

        BatchHandle { tasks, rejected }
    }
}

/// Wait for a free worker, then run the pipeline on a blocking thread.
async fn run_on_worker(workers: Arc<Semaphore>, runner: JobRunner, sink: EventSink) {
    let permit = match workers.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            error!("Worker pool unavailable: {}", e);
            sink.failed("Worker pool unavailable");
            return;
        }
    };

    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        runner.run(sink);
    })
    .await;

    if let Err(e) = joined {
        error!("Worker task ended abnormally: {}", e);
    }
}

/// Handle on a scheduled batch
pub struct BatchHandle {
    tasks: Vec<JoinHandle<()>>,
    rejected: Vec<SourceFile>,
}

impl BatchHandle {
    /// Number of files that were scheduled.
    pub fn scheduled(&self) -> usize {
        self.tasks.len()
    }

    /// Files over the cap that were not scheduled.
    pub fn rejected(&self) -> &[SourceFile] {
        &self.rejected
    }

    /// Wait for every scheduled runner to finish.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Batch task ended abnormally: {}", e);
            }
        }
    }
}
