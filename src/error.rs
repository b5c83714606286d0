//! # Error Handling
//!
//! One error type, [`ToolError`], covers every failure the pipeline can report, plus a
//! small set of classification traits so callers can decide what to do with an error
//! without matching on every variant.
//!
//! ## Scope of an error
//!
//! - **Batch-level**: configuration problems and archive failures. These abort the
//!   batch before it starts (or before the download is produced).
//! - **Item-level**: size limit, decode, encode and remote call failures. The
//!   orchestrator turns these into a notice for that item and moves on.
//! - **Advisory**: remote cleanup failures. Logged, never surfaced as a failure.
//!
//! ## Usage
//!
//! ```rust
//! use image_batch_tools::error::{ErrorSeverity, HasSeverity, ToolError};
//!
//! let error = ToolError::Decode {
//!     name: "bad.jpg".into(),
//!     reason: "unexpected end of file".into(),
//! };
//! assert!(!error.is_batch_fatal());
//! assert_eq!(error.severity(), ErrorSeverity::Error);
//! ```

use cloud_transform::CloudError;
use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Advisory only, the current batch is unaffected
    Warning,
    /// One item could not be processed
    Error,
    /// The batch result could not be produced
    Critical,
    /// The batch cannot start
    Fatal,
}

/// Every failure the tools report.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The remote client is unavailable (missing or malformed credentials).
    #[error("remote service is not configured: {reason}")]
    Configuration { reason: String },

    /// A tool setting is out of range.
    #[error("invalid {field} `{value}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The upload's extension is not accepted by the tool.
    #[error("{name} is not a supported file type (accepted: {accepted})")]
    UnsupportedExtension { name: String, accepted: String },

    /// The declared upload size is over the tool's ceiling.
    #[error("{name} exceeds the {} MB limit ({size} bytes)", .limit / MIB)]
    SizeLimitExceeded { name: String, size: u64, limit: u64 },

    /// The payload is not a decodable image.
    #[error("{name} could not be decoded: {reason}")]
    Decode { name: String, reason: String },

    /// Re-encoding a decoded image failed.
    #[error("{name} could not be re-encoded: {reason}")]
    Encode { name: String, reason: String },

    /// Transform or fetch against the remote service failed.
    #[error("remote processing of {name} failed: {source}")]
    RemoteCall {
        name: String,
        #[source]
        source: CloudError,
    },

    /// Deleting remote resources failed. Advisory.
    #[error("remote cleanup failed: {source}")]
    Cleanup {
        #[source]
        source: CloudError,
    },

    /// The download archive could not be written.
    #[error("archive could not be written: {reason}")]
    Archive { reason: String },

    /// Reading an upload from disk failed.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate.
pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    /// True for errors that stop the whole batch rather than one item.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::InvalidConfig { .. } | Self::Archive { .. }
        )
    }
}

impl From<zip::result::ZipError> for ToolError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive {
            reason: error.to_string(),
        }
    }
}

/// Trait for errors that may succeed if the same call is repeated
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ToolError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteCall { source, .. } | Self::Cleanup { source } => source.is_transient(),
            _ => false,
        }
    }
}

/// Trait for errors that carry a severity
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ToolError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration { .. } | Self::InvalidConfig { .. } => ErrorSeverity::Fatal,
            Self::Archive { .. } => ErrorSeverity::Critical,
            Self::Cleanup { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Trait for errors that can tell the user what to do next
pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&'static str>;
}

impl HasRecoverySuggestion for ToolError {
    fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Configuration { .. } => {
                Some("Set CLOUDINARY_URL to cloudinary://<api_key>:<api_secret>@<cloud_name>")
            }
            Self::InvalidConfig { .. } => Some("Width and height must be between 100 and 3000 px"),
            Self::UnsupportedExtension { .. } => Some("Convert the file to PNG or JPEG first"),
            Self::SizeLimitExceeded { .. } => Some("Downscale or split the image before uploading"),
            Self::RemoteCall { source, .. } if source.is_auth_failure() => {
                Some("Check the API key and secret of the configured account")
            }
            Self::RemoteCall { source, .. } if source.is_transient() => {
                Some("The service is busy or unreachable; try the item again later")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limit_message_names_file_and_limit() {
        let error = ToolError::SizeLimitExceeded {
            name: "poster.png".into(),
            size: 10 * MIB + 1,
            limit: 10 * MIB,
        };
        let message = error.to_string();
        assert!(message.contains("poster.png"));
        assert!(message.contains("10 MB"));
    }

    #[test]
    fn classification() {
        let config = ToolError::Configuration {
            reason: "CLOUDINARY_URL not set".into(),
        };
        assert!(config.is_batch_fatal());
        assert_eq!(config.severity(), ErrorSeverity::Fatal);
        assert!(config.recovery_suggestion().is_some());
        assert!(!config.is_retryable());

        let cleanup = ToolError::Cleanup {
            source: CloudError::Status {
                operation: "delete",
                status: 503,
                body: String::new(),
            },
        };
        assert!(!cleanup.is_batch_fatal());
        assert_eq!(cleanup.severity(), ErrorSeverity::Warning);
        assert!(cleanup.is_retryable());

        let remote = ToolError::RemoteCall {
            name: "a.png".into(),
            source: CloudError::Status {
                operation: "upload",
                status: 401,
                body: "bad signature".into(),
            },
        };
        assert!(!remote.is_retryable());
        assert_eq!(
            remote.recovery_suggestion(),
            Some("Check the API key and secret of the configured account")
        );
    }
}
