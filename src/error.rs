//! Error types for the RAM controller

use thiserror::Error as ThisError;

use crate::ram::{ApiError, ApiErrorKind};

/// Result type for the controller
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the controller
#[derive(Debug, ThisError)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Desired state rejected before any remote call was made
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The remote entity does not exist (yet)
    #[error("resource not found")]
    NotFound,

    /// RAM API error
    #[error(transparent)]
    Aws(#[from] ApiError),

    /// Finalizer error
    #[error("Finalizer error: {0}")]
    FinalizerError(#[source] Box<kube::runtime::finalizer::Error<Error>>),
}

/// How the controller should react to an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retrying cannot help until the desired state changes
    Terminal,
    /// Retried by the controller runtime with backoff
    Recoverable,
}

impl Error {
    /// Classify the error for condition reporting and requeue decisions
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::ValidationError(_) | Error::ConfigError(_) => ErrorClass::Terminal,
            Error::Aws(e) if e.kind == ApiErrorKind::InvalidParameter => ErrorClass::Terminal,
            _ => ErrorClass::Recoverable,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() == ErrorClass::Terminal
    }

    /// True when the remote entity is absent and needs creating
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound => true,
            Error::Aws(e) => e.kind == ApiErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<kube::runtime::finalizer::Error<Error>> for Error {
    fn from(err: kube::runtime::finalizer::Error<Error>) -> Self {
        Error::FinalizerError(Box::new(err))
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        Error::KubeError(err.to_string())
    }
}
