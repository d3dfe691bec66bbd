use std::io;
use std::path::PathBuf;

use speechbatch_transcoder::ConversionError;

use crate::clients::SessionError;

/// Anything that stops one file's pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to write {path:?}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Internal error: {0}")]
    Panicked(String),
}

/// Failure text for a rejected API token
pub const UNAUTHORIZED_MESSAGE: &str =
    "Invalid API token. Check SPEECHMATICS_API_TOKEN or config.json.";

impl PipelineError {
    /// Message reported on the file's `Failed` event.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Session(e) if e.is_unauthorized() => UNAUTHORIZED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_token_gets_a_clear_message() {
        let err = PipelineError::from(SessionError::Submission(
            "API returned status 401 Unauthorized: Permission Denied".to_string(),
        ));
        assert_eq!(err.user_message(), UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn test_other_errors_keep_their_text() {
        assert_eq!(
            PipelineError::from(SessionError::Server).user_message(),
            "Server error"
        );
        assert_eq!(
            PipelineError::from(ConversionError::ToolNotFound).user_message(),
            ConversionError::ToolNotFound.to_string()
        );
    }
}
