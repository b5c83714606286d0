//! # Processing Module
//!
//! Per-item steps of each tool and the naming rules for their outputs.

pub mod naming;
#[allow(clippy::module_inception)]
pub mod processing;
pub mod reencode;
pub mod remote;

// Re-export commonly used types for convenience
pub use naming::derive_name;
pub use processing::{
    ItemOutcome, ItemProcessor, ItemStatus, OutputFormat, ProcessedResult, SkipReason,
};
pub use reencode::{EncodingDecision, LocalOptimizer, optimize};
pub use remote::{RemoteProcessor, initialize, sweep_stale_resources};
