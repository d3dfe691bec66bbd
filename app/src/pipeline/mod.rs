mod artifacts;
mod converter;
mod error;
mod events;
mod observer;
mod orchestrator;
mod runner;

// Public exports
pub use artifacts::TranscriptArtifacts;
pub use converter::MediaConverter;
pub use error::{PipelineError, UNAUTHORIZED_MESSAGE};
pub use events::{FileEvent, FileSlot, LifecycleEvent, PREPARING};
pub use observer::{ChannelObserver, EventSink, JobObserver};
pub use orchestrator::{BatchHandle, Orchestrator};
pub use runner::{JobRunner, PollPolicy, MAX_CONSECUTIVE_POLL_FAILURES, POLL_INTERVAL};
