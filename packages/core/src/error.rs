//! Error types for building requests and decoding responses.

/// Failure while turning a descriptor into an outbound request.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while turning response bytes into a typed value.
#[derive(thiserror::Error, Debug)]
pub enum DecodingError {
    /// The payload did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A date field did not match the configured date format.
    #[error("Invalid date: {value}")]
    InvalidDate { value: String },
}

impl DecodingError {
    /// The offending date string, if this is a date format failure.
    pub fn invalid_date(&self) -> Option<&str> {
        match self {
            DecodingError::InvalidDate { value } => Some(value),
            DecodingError::Json(_) => None,
        }
    }
}
