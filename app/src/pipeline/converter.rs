use std::path::{Path, PathBuf};

use speechbatch_transcoder::{AudioFormat, ConversionError, Transcoder};

/// Normalizes a source file into the upload format.
///
/// Must write exactly one file on success and return its path.
pub trait MediaConverter: Send + Sync {
    fn convert(&self, source: &Path, format: AudioFormat) -> Result<PathBuf, ConversionError>;
}

impl MediaConverter for Transcoder {
    fn convert(&self, source: &Path, format: AudioFormat) -> Result<PathBuf, ConversionError> {
        Transcoder::convert(self, source, format)
    }
}
