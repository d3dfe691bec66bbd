//! Per-file lifecycle events.
//!
//! Serialized with a `state` tag so a front-end can consume them as JSON
//! lines.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Status text emitted before conversion starts
pub const PREPARING: &str = "Preparing…";

/// Lifecycle event for one file - a single stream per file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// Human-readable stage, e.g. "Preparing…" or "Running"
    #[serde(rename = "status")]
    StatusChanged { text: String },
    /// Remote progress in 0..=100
    #[serde(rename = "progress")]
    ProgressChanged { percent: u8 },
    /// Both transcripts are on disk
    #[serde(rename = "completed")]
    Completed {
        #[serde(rename = "txtPath")]
        txt_path: PathBuf,
        #[serde(rename = "srtPath")]
        srt_path: PathBuf,
    },
    /// The pipeline stopped on an error
    #[serde(rename = "failed")]
    Failed { message: String },
}

impl LifecycleEvent {
    /// Completed and Failed end a file's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleEvent::Completed { .. } | LifecycleEvent::Failed { .. }
        )
    }
}

/// The observer slot a file's events are addressed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSlot {
    /// Position of the file in the submitted batch
    pub index: usize,
    pub source: PathBuf,
}

/// An event together with the slot it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvent {
    pub slot: FileSlot,
    #[serde(flatten)]
    pub event: LifecycleEvent,
}
