//! # Core Module
//!
//! Building blocks shared by every tool: upload payloads, batch statistics, progress
//! reporting and cancellation.

pub mod payload;
pub mod progress;
pub mod stats;

pub use payload::ImagePayload;
pub use progress::{CancellationToken, Progress};
pub use stats::{BatchStats, format_kib};
