//! Typed error types for filtrate.

/// All errors produced by the filtrate library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] filtrate_core::Error),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the error is a filter body's own failure rather than a
    /// problem with the call itself.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_validation_failure())
    }
}

/// A `Result` alias where the error type is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
