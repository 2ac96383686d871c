use std::fmt;

use thiserror::Error;

/// Coarse classification of a failed turn, used by the chat loop to decide
/// what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CredentialMissing,
    NetworkError,
    MalformedResponse,
    ApiError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::CredentialMissing => "credential missing",
            ErrorKind::NetworkError => "network error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::ApiError => "API error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ShoppingError {
    #[error("{0} is not set")]
    CredentialMissing(&'static str),

    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    MalformedResponse(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
}

impl ShoppingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShoppingError::CredentialMissing(_) => ErrorKind::CredentialMissing,
            ShoppingError::Network(_) => ErrorKind::NetworkError,
            ShoppingError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ShoppingError::Api { .. } => ErrorKind::ApiError,
        }
    }
}

// The search key travels in the query string, so request URLs are never kept.
impl From<reqwest::Error> for ShoppingError {
    fn from(err: reqwest::Error) -> Self {
        ShoppingError::Network(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, ShoppingError>;
