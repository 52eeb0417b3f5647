/*!
 * Error types for the tabiyaku translation engine.
 *
 * This module contains custom error types for the different layers of the
 * engine, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the translation provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Too many requests
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider refused the request because the character quota is spent
    #[error("Provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// No provider code is configured for a logical language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The usage endpoint could not be read
    #[error("Usage unavailable: {0}")]
    UsageUnavailable(String),
}

impl ProviderError {
    /// Whether the failure is a "too many requests" answer
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429,
            _ => false,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::ParseError(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::QuotaExceeded(_)
            | Self::AuthenticationError(_)
            | Self::UnsupportedLanguage(_)
            | Self::UsageUnavailable(_) => false,
        }
    }
}

/// Errors raised by cache storage backends
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored cache could not be encoded or decoded
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The SQLite backend failed
    #[error("Cache database failed: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.to_string())
    }
}

/// Errors that abort a whole engine run before any per-language work
#[derive(Error, Debug)]
pub enum EngineError {
    /// A requested language is outside the supported set
    #[error("Invalid target language: {0}")]
    InvalidTargetLanguage(String),

    /// The source document does not exist in the store
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The source document is not written in the configured source language
    #[error("Document {id} is in '{found}', expected source language '{expected}'")]
    WrongSourceLanguage {
        /// Document id
        id: String,
        /// Declared language of the document
        found: String,
        /// Configured source language
        expected: String,
    },

    /// The document is itself a translation of another document
    #[error("Document {id} is already a translation of {source_id}")]
    AlreadyATranslation {
        /// Document id
        id: String,
        /// Id of the document it was translated from
        source_id: String,
    },

    /// The rich-text body failed structural validation
    #[error("Invalid document structure: {}", .0.join("; "))]
    InvalidStructure(Vec<String>),

    /// The provider quota would be exceeded by this run
    #[error("Translation quota would be exceeded: {used} used + {estimated} estimated > {allowed} allowed")]
    QuotaWouldBeExceeded {
        /// Characters already used this period
        used: u64,
        /// Estimated characters for the run
        estimated: u64,
        /// Characters allowed by the check threshold
        allowed: u64,
    },

    /// The configured monthly ceiling would be exceeded by this run
    #[error("Monthly character limit exceeded: {projected} projected > {limit} limit")]
    MonthlyLimitExceeded {
        /// Usage after the run
        projected: u64,
        /// Configured ceiling
        limit: u64,
    },

    /// The content store failed
    #[error("Content store error: {0}")]
    Store(String),

    /// The run did not finish before its deadline
    #[error("Translation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl EngineError {
    /// Whether the error comes from checking inputs rather than doing work
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTargetLanguage(_)
                | Self::DocumentNotFound(_)
                | Self::WrongSourceLanguage { .. }
                | Self::AlreadyATranslation { .. }
                | Self::InvalidStructure(_)
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
