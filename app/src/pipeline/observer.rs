use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;

use super::events::{FileEvent, FileSlot, LifecycleEvent};

/// Message emitted if a runner goes away without reporting an outcome
const NO_OUTCOME: &str = "Job ended without a result";

/// Receives every file's events, tagged with the file's slot.
///
/// Called from worker threads; implementations must not block for long.
pub trait JobObserver: Send + Sync {
    fn on_event(&self, slot: &FileSlot, event: LifecycleEvent);
}

/// Forwards events into an unbounded channel
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<FileEvent>,
}

impl ChannelObserver {
    /// Create the observer and the receiving end of its channel.
    ///
    /// The channel closes once the observer and every sink holding it are
    /// dropped.
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<FileEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl JobObserver for ChannelObserver {
    fn on_event(&self, slot: &FileSlot, event: LifecycleEvent) {
        let message = FileEvent {
            slot: slot.clone(),
            event,
        };
        if self.tx.send(message).is_err() {
            debug!("Event receiver dropped, discarding event for {:?}", slot.source);
        }
    }
}

/// One file's event outlet.
///
/// Terminal events consume the sink, so a runner can report at most one
/// outcome. A sink dropped without one reports a failure.
pub struct EventSink {
    slot: FileSlot,
    observer: Arc<dyn JobObserver>,
    finished: bool,
}

impl EventSink {
    pub fn new(slot: FileSlot, observer: Arc<dyn JobObserver>) -> Self {
        Self {
            slot,
            observer,
            finished: false,
        }
    }

    pub fn slot(&self) -> &FileSlot {
        &self.slot
    }

    pub fn status(&self, text: impl Into<String>) {
        self.emit(LifecycleEvent::StatusChanged { text: text.into() });
    }

    pub fn progress(&self, percent: u8) {
        self.emit(LifecycleEvent::ProgressChanged {
            percent: percent.min(100),
        });
    }

    pub fn completed(mut self, txt_path: PathBuf, srt_path: PathBuf) {
        self.finish(LifecycleEvent::Completed { txt_path, srt_path });
    }

    pub fn failed(mut self, message: impl Into<String>) {
        self.finish(LifecycleEvent::Failed {
            message: message.into(),
        });
    }

    fn finish(&mut self, event: LifecycleEvent) {
        self.finished = true;
        self.emit(event);
    }

    fn emit(&self, event: LifecycleEvent) {
        self.observer.on_event(&self.slot, event);
    }
}

impl Drop for EventSink {
    fn drop(&mut self) {
        if !self.finished {
            warn!("No outcome reported for {:?}", self.slot.source);
            self.finish(LifecycleEvent::Failed {
                message: NO_OUTCOME.to_string(),
            });
        }
    }
}
