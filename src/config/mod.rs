//! # Configuration Module
//!
//! Tool settings, size ceilings and the closed set of accepted upload extensions.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{
    COMPRESS_LIMIT_BYTES, DEFAULT_HEIGHT, DEFAULT_WIDTH, ImageExtension, MAX_DIMENSION, MIN_DIMENSION, REMOTE_LIMIT_BYTES,
    ToolConfig, ToolKind,
};
