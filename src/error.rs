use thiserror::Error;

use crate::types::RawResponse;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("no account_info_url provided")]
    MissingAccountInfoUrl,

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("http status {}", .response.status)]
    HttpStatus { response: RawResponse },

    #[error("invalid response: {message}")]
    InvalidResponse {
        message: String,
        response: RawResponse,
    },

    #[error("no token returned")]
    MissingAccessToken {
        response: RawResponse,
        body: serde_json::Value,
    },
}

/// Failure inside a [`Transport`](crate::Transport) implementation, raised
/// before any HTTP status was obtained.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(Box::new(err))
    }
}
