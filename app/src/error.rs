use derive_more::{Display, From};

/// Errors that stop the process before or around a batch
#[derive(Debug, From, Display)]
pub enum Error {
    #[from]
    #[display("{_0}")]
    Config(crate::config::ConfigError),

    #[from]
    #[display("Failed to start runtime: {_0}")]
    Runtime(std::io::Error),

    #[from]
    #[display("Failed to create HTTP client: {_0}")]
    Http(reqwest::Error),
}

impl std::error::Error for Error {}
