use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

use crate::config::{IntermediateFormat, OperatingPoint, Settings, SETTINGS_FILE};
use crate::logging::default_level;
use crate::pipeline::{FileEvent, LifecycleEvent, PollPolicy, POLL_INTERVAL};

#[derive(Debug, Parser)]
#[command(name = "speechbatch", author, version, about, long_about = None)]
pub struct Cli {
    /// Audio or video files to transcribe (at most 10)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Settings file whose keys override the environment defaults
    #[arg(long, value_name = "PATH", default_value = SETTINGS_FILE)]
    pub config: PathBuf,

    /// Transcription language code, e.g. "fa" or "en"
    #[arg(short, long)]
    pub language: Option<String>,

    /// Extract uncompressed WAV instead of MP3
    #[arg(long, conflicts_with = "mp3")]
    pub wav: bool,

    /// Extract 128 kbps MP3
    #[arg(long)]
    pub mp3: bool,

    /// Accuracy mode: standard or enhanced
    #[arg(long, value_name = "MODE")]
    pub operating_point: Option<OperatingPoint>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Seconds between job status queries
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = POLL_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        hide = true
    )]
    pub poll_interval: u64,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, env = "SPEECHBATCH_LOG", value_parser = parse_level, default_value_t = default_level())]
    pub log_level: LevelFilter,
}

impl Cli {
    /// Settings layer built from the flags that were given.
    pub fn overrides(&self) -> Settings {
        let intermediate_format = if self.wav {
            Some(IntermediateFormat::Wav)
        } else if self.mp3 {
            Some(IntermediateFormat::Mp3)
        } else {
            None
        };

        Settings {
            language: self.language.clone(),
            operating_point: self.operating_point,
            intermediate_format,
            ffmpeg_path: self.ffmpeg.clone(),
            ..Settings::default()
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval),
            ..PollPolicy::default()
        }
    }
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("invalid log level '{}'", value))
}

/// One output line for `event`.
pub fn render_event(event: &FileEvent, json: bool) -> String {
    if json {
        return serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e));
    }

    let name = event
        .slot
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("[{}] {}", event.slot.index + 1, name);

    match &event.event {
        LifecycleEvent::StatusChanged { text } => format!("{}: {}", prefix, text),
        LifecycleEvent::ProgressChanged { percent } => format!("{}: {}%", prefix, percent),
        LifecycleEvent::Completed { txt_path, srt_path } => format!(
            "{}: done -> {}, {}",
            prefix,
            txt_path.display(),
            srt_path.display()
        ),
        LifecycleEvent::Failed { message } => format!("{}: failed: {}", prefix, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FileSlot;

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "speechbatch",
            "--wav",
            "--language",
            "en",
            "--operating-point",
            "standard",
            "a.mp4",
            "b.mp3",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(overrides.intermediate_format, Some(IntermediateFormat::Wav));
        assert_eq!(overrides.language.as_deref(), Some("en"));
        assert_eq!(overrides.operating_point, Some(OperatingPoint::Standard));
        assert!(overrides.api_token.is_none());
    }

    #[test]
    fn test_defaults_leave_settings_untouched() {
        let cli = Cli::try_parse_from(["speechbatch", "a.mp4"]).unwrap();

        assert_eq!(cli.overrides(), Settings::default());
        assert_eq!(cli.config, PathBuf::from(SETTINGS_FILE));
        assert_eq!(cli.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_conflicting_and_missing_arguments() {
        assert!(Cli::try_parse_from(["speechbatch", "--wav", "--mp3", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["speechbatch"]).is_err());
        assert!(Cli::try_parse_from(["speechbatch", "--log-level", "loud", "a.mp4"]).is_err());
    }

    #[test]
    fn test_poll_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["speechbatch", "--poll-interval", "0", "a.mp4"]).is_err());

        let cli = Cli::try_parse_from(["speechbatch", "--poll-interval", "2", "a.mp4"]).unwrap();
        assert_eq!(cli.poll_policy().interval, Duration::from_secs(2));
    }

    #[test]
    fn test_render_event_text() {
        let event = FileEvent {
            slot: FileSlot {
                index: 0,
                source: PathBuf::from("/m/interview.mp4"),
            },
            event: LifecycleEvent::ProgressChanged { percent: 40 },
        };

        assert_eq!(render_event(&event, false), "[1] interview.mp4: 40%");
        assert!(render_event(&event, true).contains(r#""state":"progress""#));
    }

    #[test]
    fn test_render_completed_lists_both_transcripts() {
        let event = FileEvent {
            slot: FileSlot {
                index: 2,
                source: PathBuf::from("/m/call.mkv"),
            },
            event: LifecycleEvent::Completed {
                txt_path: PathBuf::from("/m/call.txt"),
                srt_path: PathBuf::from("/m/call.srt"),
            },
        };

        assert_eq!(
            render_event(&event, false),
            "[3] call.mkv: done -> /m/call.txt, /m/call.srt"
        );
    }
}
