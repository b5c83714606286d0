//! # Image Batch Tools Library
//!
//! Batch image utilities: the user supplies a set of images, applies one tool to all of
//! them, and gets the results back individually or packed into a single ZIP.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `config`: Tool selection, size ceilings, accepted extensions and dimensions
//! - `core`: Upload payloads, progress reporting and batch statistics
//! - `processing`: The per-item steps (local re-encode, remote transform) and naming
//! - `session`: Batch orchestration with partial-failure isolation
//! - `archive`: ZIP packaging of the successful results
//! - `error`: Error types and classification traits
//!
//! Remote work (canvas expansion, smart crop) goes through the `cloud_transform`
//! crate; nothing but re-encoding happens locally.
//!
//! ## Tools
//!
//! | Tool | Path | Ceiling |
//! |------|------|---------|
//! | `compress` | local re-encode, kept only if smaller | 50 MB |
//! | `expand` | remote AI canvas expansion | 10 MB |
//! | `crop` | remote content-aware crop | 10 MB |
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_batch_tools::{ImagePayload, ToolConfig, ToolKind, run_tool};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let payloads = vec![ImagePayload::from_path("photo.png".as_ref())?];
//! let report = run_tool(&ToolConfig::new(ToolKind::Compress), &payloads, None)?;
//! println!("{} processed, {} bytes saved", report.stats.processed, report.stats.total_saved);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod core;
pub mod error;
pub mod processing;
pub mod session;

use cloud_transform::RemoteTransform;
use tracing::info;

/// Re-export error types for convenience
pub use error::{ErrorSeverity, HasRecoverySuggestion, HasSeverity, Retryable, ToolError, ToolResult};

pub use archive::{Archive, archive_file_name, pack, pack_results};
pub use config::{ToolConfig, ToolKind};
pub use crate::core::{BatchStats, CancellationToken, ImagePayload, Progress};
pub use processing::{
    ItemOutcome, ItemProcessor, ItemStatus, LocalOptimizer, ProcessedResult, RemoteProcessor,
    SkipReason, derive_name, optimize,
};
pub use session::{BatchReport, BatchSession, BatchSessionBuilder, Notice, NoticeKind, run_batch};

/// Run one tool over `payloads` with default session settings.
///
/// `compress` runs locally and ignores `remote`. The remote tools need a client and
/// fail with [`ToolError::Configuration`] when `remote` is `None`; invalid settings
/// fail with [`ToolError::InvalidConfig`]. Both are reported before any item is
/// touched. Per-item problems never surface here, they are in the report.
pub fn run_tool(
    config: &ToolConfig,
    payloads: &[ImagePayload],
    remote: Option<&dyn RemoteTransform>,
) -> ToolResult<BatchReport> {
    config.validate()?;
    info!(tool = config.kind.as_str(), items = payloads.len(), "starting batch");

    let mut session = BatchSession::for_tool(config).build();
    let report = match config.kind {
        ToolKind::Compress => session.run(payloads, &LocalOptimizer),
        ToolKind::Expand | ToolKind::Crop => {
            let client = remote.ok_or_else(|| ToolError::Configuration {
                reason: format!("the {} tool needs the remote service", config.kind.as_str()),
            })?;
            let processor = RemoteProcessor::new(client, config.clone())?;
            session.run(payloads, &processor)
        }
    };
    Ok(report)
}
