//! Media normalization through an external ffmpeg process.
//!
//! Every source file, audio or video, is turned into a single-channel
//! 16 kHz audio file next to the original, ready for speech-to-text upload.
//!
//! # Example
//!
//! ```no_run
//! use speechbatch_transcoder::{AudioFormat, Transcoder};
//! use std::path::Path;
//!
//! fn main() -> Result<(), speechbatch_transcoder::ConversionError> {
//!     let transcoder = Transcoder::new(None);
//!     let mp3 = transcoder.convert(Path::new("/tmp/lecture.mp4"), AudioFormat::Mp3)?;
//!     println!("wrote {}", mp3.display());
//!     Ok(())
//! }
//! ```

mod format;
mod locate;

pub use format::{AudioFormat, COMPRESSED_BITRATE, SAMPLE_RATE_HZ};
pub use locate::find_ffmpeg;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info};
use thiserror::Error;

/// Lines of ffmpeg stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 5;

/// Errors that can occur while normalizing a media file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// ffmpeg is neither configured, on `PATH`, nor bundled with the executable.
    #[error("ffmpeg not found (install it on PATH or place it next to the executable)")]
    ToolNotFound,

    /// The source file vanished before conversion started.
    #[error("Source file not found: {0}")]
    MissingSource(PathBuf),

    /// ffmpeg could not be started.
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(#[source] io::Error),

    /// ffmpeg ran but exited unsuccessfully.
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Handle on the external transcoder.
///
/// The executable is resolved on every conversion, so a missing tool is
/// reported per file rather than once at startup.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    explicit_program: Option<PathBuf>,
}

impl Transcoder {
    /// Create a transcoder, optionally pinned to an explicit ffmpeg path.
    pub fn new(explicit_program: Option<PathBuf>) -> Self {
        Self { explicit_program }
    }

    /// Resolve the executable to run.
    pub fn resolve(&self) -> Result<PathBuf, ConversionError> {
        match &self.explicit_program {
            Some(program) if program.is_file() => Ok(program.clone()),
            Some(program) => {
                debug!("Configured ffmpeg path does not exist: {:?}", program);
                Err(ConversionError::ToolNotFound)
            }
            None => find_ffmpeg().ok_or(ConversionError::ToolNotFound),
        }
    }

    /// Convert `source` into `format`, returning the written file's path.
    ///
    /// Any previous file at the output path is overwritten. On failure the
    /// output path may hold a partial file; callers must not read it.
    pub fn convert(&self, source: &Path, format: AudioFormat) -> Result<PathBuf, ConversionError> {
        if !source.exists() {
            return Err(ConversionError::MissingSource(source.to_path_buf()));
        }

        let program = self.resolve()?;
        let output = format.output_path(source);
        let args = arguments(source, &output, format);

        debug!("Running {:?} {:?}", program, args);

        let result = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ConversionError::ToolNotFound,
                _ => ConversionError::Spawn(e),
            })?;

        if !result.status.success() {
            let stderr = stderr_tail(&result.stderr);
            debug!("ffmpeg stderr for {:?}:\n{}", source, stderr);
            return Err(ConversionError::Failed {
                status: result.status,
                stderr,
            });
        }

        info!("Converted {:?} -> {:?}", source, output);
        Ok(output)
    }
}

/// Build the ffmpeg argument list.
///
/// Drops video, forces one channel at 16 kHz and, for MP3, sets a fixed
/// bitrate. `-y` overwrites an existing output.
pub fn arguments(source: &Path, output: &Path, format: AudioFormat) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        source.as_os_str().to_owned(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        SAMPLE_RATE_HZ.to_string().into(),
    ];

    if format.is_compressed() {
        args.push("-b:a".into());
        args.push(COMPRESSED_BITRATE.into());
    }

    args.push(output.as_os_str().to_owned());
    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn mp3_arguments_carry_bitrate() {
        let args = arguments(
            Path::new("/in/talk.mp4"),
            Path::new("/in/talk.mp3"),
            AudioFormat::Mp3,
        );

        assert_eq!(
            as_strings(&args),
            vec![
                "-y", "-i", "/in/talk.mp4", "-vn", "-ac", "1", "-ar", "16000", "-b:a", "128k",
                "/in/talk.mp3"
            ]
        );
    }

    #[test]
    fn wav_arguments_have_no_bitrate() {
        let args = arguments(
            Path::new("/in/talk.mp4"),
            Path::new("/in/talk.wav"),
            AudioFormat::Wav,
        );
        let args = as_strings(&args);

        assert!(!args.contains(&"-b:a".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/in/talk.wav"));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = b"a\nb\n\nc\nd\ne\nf\ng\n";
        assert_eq!(stderr_tail(stderr), "c\nd\ne\nf\ng");
    }

    #[test]
    fn explicit_missing_program_is_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Transcoder::new(Some(dir.path().join("no-such-ffmpeg")));

        assert!(matches!(
            transcoder.resolve(),
            Err(ConversionError::ToolNotFound)
        ));
    }

    #[test]
    fn missing_source_is_reported_before_resolving_tool() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Transcoder::new(Some(dir.path().join("no-such-ffmpeg")));

        let err = transcoder
            .convert(&dir.path().join("gone.mp4"), AudioFormat::Mp3)
            .unwrap_err();
        assert!(matches!(err, ConversionError::MissingSource(_)));
    }
}
