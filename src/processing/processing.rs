//! # Per-Item Processing
//!
//! The orchestrator drives every tool through one interface, [`ItemProcessor`]:
//! given an upload, produce a [`ProcessedResult`], report that the item was not worth
//! keeping (`Ok(None)`), or fail with a [`ToolError`].
//!
//! ## Outcomes
//!
//! The orchestrator records each item as an [`ItemStatus`]:
//!
//! - `Success(ProcessedResult)`: goes into the archive
//! - `Skipped(SkipReason)`: size limit, no reduction, cancelled; not an error
//! - `Failed(ToolError)`: decode, encode, remote call failures
//!
//! Presentation code renders these however it likes; nothing here prints.

use std::fmt;

use crate::core::ImagePayload;
use crate::core::stats::format_kib;
use crate::error::{ToolError, ToolResult};

/// Encoded format of a result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    /// Anything else the remote service reports, lower-cased.
    Other(String),
}

impl OutputFormat {
    /// Parse a format tag as reported by an encoder or the remote service.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "jpg" | "jpeg" => OutputFormat::Jpeg,
            "webp" => OutputFormat::Webp,
            "gif" => OutputFormat::Gif,
            other => OutputFormat::Other(other.to_string()),
        }
    }

    /// Lower-case tag, used to derive the output file extension.
    pub fn tag(&self) -> &str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Other(tag) => tag,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag().to_ascii_uppercase())
    }
}

/// One successfully processed upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedResult {
    /// Archive entry / download name.
    pub name: String,
    /// Name of the upload this came from.
    pub source_name: String,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    /// Declared size of the upload.
    pub original_size: u64,
    pub output_size: u64,
}

impl ProcessedResult {
    /// Bytes saved; negative when the output grew.
    pub fn saved(&self) -> i64 {
        self.original_size as i64 - self.output_size as i64
    }
}

/// Why an item produced no result without failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared size is above the tool's ceiling; never decoded.
    ExceedsLimit { size: u64, limit: u64 },
    /// Re-encoding did not make the file smaller.
    NotReduced { original: u64 },
    /// The batch was cancelled before this item was reached.
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExceedsLimit { limit, .. } => {
                write!(f, "exceeds the {} MB limit", limit / (1024 * 1024))
            }
            SkipReason::NotReduced { original } => write!(
                f,
                "not optimized, re-encoding could not reduce its {}",
                format_kib(*original as i64)
            ),
            SkipReason::Cancelled => f.write_str("batch cancelled before processing"),
        }
    }
}

/// Outcome of one item.
#[derive(Debug)]
pub enum ItemStatus {
    Success(ProcessedResult),
    Skipped(SkipReason),
    Failed(ToolError),
}

/// One item's outcome, tagged with its input position and name.
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub name: String,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn result(&self) -> Option<&ProcessedResult> {
        match &self.status {
            ItemStatus::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Success(_))
    }
}

/// Transformation applied to each upload in a batch.
///
/// `index` is the upload's position in the batch, used by tools that name outputs by
/// position. Returning `Ok(None)` means the item was processed but is not worth
/// keeping.
pub trait ItemProcessor {
    fn process(&self, index: usize, payload: &ImagePayload) -> ToolResult<Option<ProcessedResult>>;
}

impl<F> ItemProcessor for F
where
    F: Fn(usize, &ImagePayload) -> ToolResult<Option<ProcessedResult>>,
{
    fn process(&self, index: usize, payload: &ImagePayload) -> ToolResult<Option<ProcessedResult>> {
        self(index, payload)
    }
}
