use super::state_manager::TransitionRejection;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The provider refused the job or the upload never reached it.
    #[error("Submission failed: {0}")]
    Submission(String),
    /// A status query failed on the network or at the provider.
    #[error("Status request failed: {0}")]
    Transport(String),
    /// The remote job reached its failed terminal phase.
    #[error("Server error")]
    Server,
    /// A transcript could not be retrieved after completion.
    #[error("Transcript download failed: {0}")]
    Fetch(String),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionRejection),
}

impl SessionError {
    /// Whether the provider answered 401 (bad or revoked token).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            SessionError::Submission(msg)
            | SessionError::Transport(msg)
            | SessionError::Fetch(msg) => msg.contains("401"),
            _ => false,
        }
    }
}
