//! User-selected source files and the capped selection list.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::BATCH_CAP;

const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aif", "aifc", "aiff", "amr", "au", "flac", "m4a", "mka", "mp2", "mp3", "oga", "ogg",
    "opus", "ra", "snd", "wav", "weba", "wma",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "mts", "ogv", "qt",
    "ts", "webm", "wmv",
];

/// Media kind derived from the file's content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Classify by extension the way a MIME type table would.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();

        if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Not an audio or video file: {0:?}")]
    NotMedia(PathBuf),
}

/// A file chosen for transcription. Immutable once selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    path: PathBuf,
    kind: MediaKind,
}

impl SourceFile {
    /// Validate `path` and classify it.
    ///
    /// Relative paths are made absolute against the working directory.
    pub fn select(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        if !path.is_file() {
            return Err(SelectionError::NotFound(path));
        }

        let kind = MediaKind::detect(&path).ok_or_else(|| SelectionError::NotMedia(path.clone()))?;
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// File name for log lines.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Result of offering a path to the selection list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    /// The list already holds [`BATCH_CAP`] files.
    Full,
    Rejected(SelectionError),
}

/// Ordered, de-duplicated list of selected files, capped at [`BATCH_CAP`].
#[derive(Debug, Default)]
pub struct SelectionQueue {
    files: Vec<SourceFile>,
}

impl SelectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl AsRef<Path>) -> AddOutcome {
        let path = path.as_ref();

        if self.files.len() >= BATCH_CAP {
            warn!("Selection full ({} files), ignoring {:?}", BATCH_CAP, path);
            return AddOutcome::Full;
        }

        let source = match SourceFile::select(path) {
            Ok(source) => source,
            Err(e) => {
                warn!("{}", e);
                return AddOutcome::Rejected(e);
            }
        };

        if self.files.iter().any(|f| f.path == source.path) {
            debug!("Already selected: {:?}", source.path);
            return AddOutcome::Duplicate;
        }

        self.files.push(source);
        AddOutcome::Added
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn into_sources(self) -> Vec<SourceFile> {
        self.files
    }
}
