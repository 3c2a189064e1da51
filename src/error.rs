//! Error types for the Pennybook application.

use thiserror::Error;

/// The main error type for Pennybook.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (snapshot files, config files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors from the network fetcher
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed URLs (endpoint paths, asset paths)
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache storage and lifecycle errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Unusable journal data (missing documents, bad payloads)
    #[error("Data error: {0}")]
    Data(String),

    /// Markdown rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// Channel communication errors
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new cache error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a new network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a new render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a new channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Check if this error is recoverable (a later refresh can succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Network(_) | Self::Channel(_))
    }
}
