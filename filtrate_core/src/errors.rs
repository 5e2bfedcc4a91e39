use thiserror::Error;

/// Failure raised by a filter's own validate or sanitize body.
///
/// The core never inspects it; it is relayed to the caller as
/// [`Error::Validation`] or delivered to a deferred completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FilterFailure {
    message: String,
}

impl FilterFailure {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for FilterFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for FilterFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid filter {name:?}: required field 'validate'")]
    InvalidFilter { name: String },

    #[error("invalid filter {name:?}, choose one of: {}", .known.join(", "))]
    UnknownFilter { name: String, known: Vec<String> },

    #[error("unknown option {option:?} for filter {filter:?}")]
    UnknownOption { option: String, filter: String },

    #[error("missing argument `{argument}`: {message}")]
    MissingArgument {
        argument: &'static str,
        message: String,
    },

    #[error("given module reference not found: {reference}")]
    UnknownModule { reference: String },

    #[error("module reference {reference:?} exceeds {limit} levels of indirection")]
    ModuleDepth { reference: String, limit: usize },

    #[error(transparent)]
    Validation(#[from] FilterFailure),

    #[error("failed to parse filter manifest: {source}")]
    Manifest {
        #[from]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// Returns true when the error was raised by a filter body rather than
    /// by registry lookup or option resolution.
    #[must_use]
    pub const fn is_validation_failure(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
