use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::clients::TranscriptFormat;

use super::error::PipelineError;

/// Transcript files written next to the converted media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptArtifacts {
    pub txt: PathBuf,
    pub srt: PathBuf,
}

impl TranscriptArtifacts {
    /// Same stem as `media`, `.txt` and `.srt` extensions.
    pub fn for_media(media: &Path) -> Self {
        Self {
            txt: media.with_extension(TranscriptFormat::Text.extension()),
            srt: media.with_extension(TranscriptFormat::Srt.extension()),
        }
    }

    /// Write both transcripts as UTF-8, replacing existing files.
    pub fn write(&self, txt: &str, srt: &str) -> Result<(), PipelineError> {
        for (path, contents) in [(&self.txt, txt), (&self.srt, srt)] {
            fs::write(path, contents).map_err(|source| PipelineError::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
        }

        info!("Wrote {:?} and {:?}", self.txt, self.srt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_media_stem() {
        let artifacts = TranscriptArtifacts::for_media(Path::new("/rec/day1.part2.wav"));
        assert_eq!(artifacts.txt, PathBuf::from("/rec/day1.part2.txt"));
        assert_eq!(artifacts.srt, PathBuf::from("/rec/day1.part2.srt"));
    }

    #[test]
    fn test_write_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = TranscriptArtifacts::for_media(&dir.path().join("a.mp3"));
        fs::write(&artifacts.txt, "stale transcript that is longer").unwrap();

        artifacts.write("سلام", "1\n00:00:00,000 --> 00:00:01,000\nسلام\n").unwrap();

        assert_eq!(fs::read_to_string(&artifacts.txt).unwrap(), "سلام");
        assert!(fs::read_to_string(&artifacts.srt).unwrap().ends_with("سلام\n"));
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = TranscriptArtifacts::for_media(&dir.path().join("missing/a.mp3"));

        match artifacts.write("a", "b") {
            Err(PipelineError::ArtifactWrite { path, .. }) => assert_eq!(path, artifacts.txt),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
