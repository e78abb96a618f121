use capsule_core::{DecodingError, RequestError};

/// Failure reported by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cache-only request with nothing cached for the URL.
    #[error("No cached response for {url}")]
    NotCached { url: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport failure: {message}")]
    Other { message: String },
}

/// Every way an `execute` call can fail.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Request construction failed: {0}")]
    RequestConstruction(#[from] RequestError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response could not be parsed as HTTP")]
    MalformedResponse,

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    #[error("Decoding failed: {0}")]
    Decoding(#[from] DecodingError),
}

impl Error {
    /// The rejected status code, for callers that branch on it.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::InvalidStatusCode(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Cancelled))
    }
}
