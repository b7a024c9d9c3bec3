//! Error types for the dashboard pipeline

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or rendering a screen.
///
/// Variants carry `String` payloads so the whole enum stays [`Clone`]:
/// a fetch result is memoized once and handed out to every card that
/// shares the fetcher.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error while fetching a data source
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A card or header failed to load its data
    #[error("Failed to load {unit}: {source}")]
    LoadError { unit: String, source: Box<Error> },

    /// Several units failed during one assembly pass
    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    AggregateError(Vec<Error>),

    /// Failed to render the screen to an image
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wraps an error with the name of the unit that produced it.
    pub fn load(unit: impl Into<String>, source: Error) -> Self {
        Error::LoadError {
            unit: unit.into(),
            source: Box::new(source),
        }
    }

    /// Folds a batch of errors into one. Empty input yields `None`, a
    /// single error is returned as-is.
    pub fn join(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Error::AggregateError(errors)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err.to_string())
    }
}
