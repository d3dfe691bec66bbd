//! Intermediate audio formats produced by the transcoder.

use std::path::{Path, PathBuf};

/// Sample rate every output is resampled to.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Bitrate used for the compressed container.
pub const COMPRESSED_BITRATE: &str = "128k";

/// Container the source media is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// Lossy MP3 at a fixed 128 kbps.
    #[default]
    Mp3,
    /// Uncompressed PCM WAV.
    Wav,
}

impl AudioFormat {
    pub fn is_compressed(self) -> bool {
        matches!(self, AudioFormat::Mp3)
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    /// Output path for `source`: same directory and stem, new extension.
    ///
    /// Pure function of its inputs, so converting the same file twice in the
    /// same mode always targets the same path.
    pub fn output_path(self, source: &Path) -> PathBuf {
        source.with_extension(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_keeps_stem_and_directory() {
        let source = Path::new("/media/talks/interview.final.mp4");

        assert_eq!(
            AudioFormat::Mp3.output_path(source),
            PathBuf::from("/media/talks/interview.final.mp3")
        );
        assert_eq!(
            AudioFormat::Wav.output_path(source),
            PathBuf::from("/media/talks/interview.final.wav")
        );
    }

    #[test]
    fn output_path_is_stable_across_calls() {
        let source = Path::new("clip.mkv");
        assert_eq!(
            AudioFormat::Mp3.output_path(source),
            AudioFormat::Mp3.output_path(source)
        );
    }

    #[test]
    fn default_format_is_compressed() {
        assert!(AudioFormat::default().is_compressed());
        assert!(!AudioFormat::Wav.is_compressed());
    }
}
