//! Error types for the admin API client

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// How a failure should be handled by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The credential was rejected; the session has been torn down
    Authentication,
    /// The API refused the request (validation, permissions, not found)
    Rejected,
    /// The request never got a usable answer (network, 5xx, bad payload)
    Transport,
}

/// Errors that can occur while talking to the admin API
#[derive(Error, Debug)]
pub enum ClientError {
    /// The API answered 401; the session has been cleared
    #[error("Session expired or credential rejected")]
    Unauthorized,

    /// No credential is held, so the request was not sent
    #[error("Not signed in")]
    NotAuthenticated,

    /// The API answered with a 4xx other than 401
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Server-provided explanation
        message: String,
    },

    /// The API answered with a 5xx
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server-provided explanation
        message: String,
    },

    /// The request could not be sent or the response not read
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape
    #[error("Failed to parse {context}: {source}")]
    Decode {
        /// What was being parsed
        context: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Input was rejected before sending
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted credentials could not be read or written
    #[error("Credential storage error: {0}")]
    Credentials(#[from] std::io::Error),

    /// Persisted credentials were unreadable
    #[error("Corrupt credential file: {0}")]
    CorruptCredentials(#[source] serde_json::Error),

    /// The base URL or a path could not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Classify the failure
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::NotAuthenticated => ErrorKind::Authentication,
            Self::Rejected { .. } | Self::Validation(_) => ErrorKind::Rejected,
            Self::Server { .. }
            | Self::Transport(_)
            | Self::Decode { .. }
            | Self::Credentials(_)
            | Self::CorruptCredentials(_)
            | Self::InvalidUrl(_) => ErrorKind::Transport,
        }
    }

    /// Whether the caller must send the user back to the login surface
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self.kind(), ErrorKind::Authentication)
    }

    /// HTTP status behind the error, when there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
