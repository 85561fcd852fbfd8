// Error taxonomy for the library. The binary wraps these in `anyhow` at the
// top of the command loop, so every variant carries a readable message.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    /// The login flow finished but no id token could be read back.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The admin API answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: StatusCode,
        endpoint: String,
        body: String,
    },

    /// Malformed user input (menu choice, update JSON).
    #[error("invalid input: {0}")]
    Input(String),

    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {endpoint} is not valid JSON")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Token or app setting that cannot travel in an HTTP header.
    #[error("value cannot be sent as an HTTP header")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("browser automation failed")]
    Browser(#[source] anyhow::Error),

    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl AdminError {
    /// Status code of an `Http` error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AdminError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
