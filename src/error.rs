//! Error taxonomies for content generation and repository creation.

use thiserror::Error;

/// Errors raised by AI adapters and provider selection.
///
/// Every variant except [`GenerationError::UnknownProvider`] is a backend
/// fault that the orchestrator absorbs by falling back to templates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("unknown AI provider \"{0}\" (expected one of: gemini, ollama, auto, none)")]
    UnknownProvider(String),
}

impl GenerationError {
    /// A protocol or transport failure with no HTTP status attached.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// A non-success HTTP response.
    pub fn api_status(status: u16, body: &str) -> Self {
        Self::Api {
            status: Some(status),
            message: format!("HTTP {status}: {}", body.trim()),
        }
    }

    /// HTTP status carried by the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors raised by the GitHub repository client.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub authentication failed: check your token ({0})")]
    Authentication(String),

    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub denied access: {0}")]
    Forbidden(String),

    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    #[error("repository \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("GitHub rejected the request: {0}")]
    Validation(String),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Transport(String),

    #[error("unexpected GitHub response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
