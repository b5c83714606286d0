// SPDX-License-Identifier: MIT
//! Errors raised by the remote transform client.

use thiserror::Error;

/// Result alias used across the crate.
pub type CloudResult<T> = Result<T, CloudError>;

/// Everything that can go wrong while talking to the remote service.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The `cloudinary://` URL could not be parsed.
    #[error("invalid credentials URL: {0}")]
    InvalidCredentials(String),

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("{operation} request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("{operation} response could not be decoded: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

impl CloudError {
    pub(crate) fn http(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Http { operation, source }
    }

    /// Timeouts, connection failures, throttling and 5xx answers may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidCredentials(_) | Self::Decode { .. } => false,
        }
    }

    /// Authentication or authorization was rejected by the service.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}
