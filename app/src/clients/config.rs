use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::config::BatchConfiguration;

/// Connection settings for the transcription API
pub struct ApiConfig {
    pub api_token: SecretString,
    /// Base URL without trailing slash, e.g. `https://asr.api.speechmatics.com/v2`
    pub api_url: String,
}

impl ApiConfig {
    pub fn new(api_token: SecretString, api_url: impl Into<String>) -> Self {
        Self {
            api_token,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl From<&BatchConfiguration> for ApiConfig {
    fn from(config: &BatchConfiguration) -> Self {
        Self::new(
            SecretString::from(config.api_token.expose_secret().to_owned()),
            config.api_url.clone(),
        )
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}
