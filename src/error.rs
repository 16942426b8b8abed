//! Error kinds surfaced by the library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration; raised before any network call.
    #[error("config error: {0}")]
    Config(String),

    /// Credentials rejected by IAM or the chat endpoint.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport failure or timeout; no HTTP status was received.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status other than an authentication failure.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The model (or a provider) answered, but not in the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a reqwest transport failure.
    pub(crate) fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(format!("{context}: {err}"))
        } else {
            Self::Network(format!("{context}: {err}"))
        }
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Auth(format!("{status}: {body}"))
            }
            _ => Self::Api {
                status: status.as_u16(),
                body,
            },
        }
    }
}
