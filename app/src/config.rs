use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use speechbatch_transcoder::AudioFormat;

/// Environment variable supplying the default API token
pub const TOKEN_ENV_VAR: &str = "SPEECHMATICS_API_TOKEN";
/// Settings file read from the working directory when present
pub const SETTINGS_FILE: &str = "config.json";

pub const DEFAULT_LANGUAGE: &str = "fa";
pub const DEFAULT_API_URL: &str = "https://asr.api.speechmatics.com/v2";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Speechmatics API token not found (set SPEECHMATICS_API_TOKEN or api_token in config.json)")]
    MissingCredential,
    #[error("Failed to read settings file {path:?}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse settings file {path:?}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Accuracy/speed trade-off requested from the provider
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OperatingPoint {
    Standard,
    #[default]
    Enhanced,
}

/// Audio container the sources are normalized into before upload
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IntermediateFormat {
    #[default]
    #[serde(alias = "compressed")]
    Mp3,
    #[serde(alias = "uncompressed")]
    Wav,
}

impl From<IntermediateFormat> for AudioFormat {
    fn from(format: IntermediateFormat) -> Self {
        match format {
            IntermediateFormat::Mp3 => AudioFormat::Mp3,
            IntermediateFormat::Wav => AudioFormat::Wav,
        }
    }
}

// ===== Settings layers =====

/// One layer of settings. Every key is optional; later layers win.
///
/// Keys match the settings file (`api_token`, `language`, ...); camelCase
/// spellings are accepted as aliases.
#[derive(Clone, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default, alias = "apiToken")]
    pub api_token: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "operatingPoint")]
    pub operating_point: Option<OperatingPoint>,
    #[serde(default, alias = "intermediateFormat")]
    pub intermediate_format: Option<IntermediateFormat>,
    #[serde(default, alias = "apiUrl")]
    pub api_url: Option<String>,
    #[serde(default, alias = "ffmpegPath")]
    pub ffmpeg_path: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("language", &self.language)
            .field("operating_point", &self.operating_point)
            .field("intermediate_format", &self.intermediate_format)
            .field("api_url", &self.api_url)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .finish()
    }
}

impl Settings {
    /// Layer holding only the token taken from the environment.
    pub fn from_env_token(token: Option<String>) -> Self {
        Self {
            api_token: token,
            ..Self::default()
        }
    }

    /// Read the settings file, or `None` if it does not exist.
    pub fn read_optional(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}", path);
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::SettingsRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings = serde_json::from_str(&contents).map_err(|source| {
            ConfigError::SettingsParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Loaded settings from {:?}", path);
        Ok(Some(settings))
    }

    /// Overlay `higher` on top of `self`.
    pub fn merge(self, higher: Settings) -> Settings {
        Settings {
            api_token: higher.api_token.or(self.api_token),
            language: higher.language.or(self.language),
            operating_point: higher.operating_point.or(self.operating_point),
            intermediate_format: higher.intermediate_format.or(self.intermediate_format),
            api_url: higher.api_url.or(self.api_url),
            ffmpeg_path: higher.ffmpeg_path.or(self.ffmpeg_path),
        }
    }
}

// ===== Batch configuration =====

/// Immutable configuration shared by every job of the process.
pub struct BatchConfiguration {
    pub api_token: SecretString,
    pub language: String,
    pub operating_point: OperatingPoint,
    pub intermediate_format: IntermediateFormat,
    pub api_url: String,
    pub ffmpeg_path: Option<PathBuf>,
}

impl fmt::Debug for BatchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfiguration")
            .field("api_token", &"[REDACTED]")
            .field("language", &self.language)
            .field("operating_point", &self.operating_point)
            .field("intermediate_format", &self.intermediate_format)
            .field("api_url", &self.api_url)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .finish()
    }
}

impl BatchConfiguration {
    /// Load from the environment and the settings file at `settings_path`,
    /// then apply `overrides` (command-line flags).
    pub fn load(settings_path: &Path, overrides: Settings) -> Result<Self, ConfigError> {
        let env_layer = Settings::from_env_token(std::env::var(TOKEN_ENV_VAR).ok());
        let file_layer = Settings::read_optional(settings_path)?.unwrap_or_default();

        Self::resolve([env_layer, file_layer, overrides])
    }

    /// Merge layers lowest-precedence first and fill in defaults.
    pub fn resolve(layers: impl IntoIterator<Item = Settings>) -> Result<Self, ConfigError> {
        let merged = layers
            .into_iter()
            .fold(Settings::default(), Settings::merge);

        let api_token = merged
            .api_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        Ok(Self {
            api_token: SecretString::from(api_token),
            language: merged
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            operating_point: merged.operating_point.unwrap_or_default(),
            intermediate_format: merged.intermediate_format.unwrap_or_default(),
            api_url: merged
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ffmpeg_path: merged.ffmpeg_path,
        })
    }

    /// Token length, for logging without exposing the value.
    pub fn token_len(&self) -> usize {
        self.api_token.expose_secret().len()
    }
}
