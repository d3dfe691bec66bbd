mod client;
mod config;
mod error;
mod session;
mod speechmatics_client;
mod state_manager;

// Re-export public types
pub use client::{JobId, JobOptions, ProviderStatus, TranscriptFormat, TranscriptionProvider};
pub use config::ApiConfig;
pub use error::SessionError;
pub use session::{phase_label, progress_percent, PollReport, TranscriptionSession};
pub use speechmatics_client::SpeechmaticsClient;
pub use state_manager::{JobEvent, JobPhase, JobStateMachine, TransitionRejection, TransitionResult};
