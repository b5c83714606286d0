//! # Upload Payloads
//!
//! An [`ImagePayload`] is one uploaded file held in memory: its bytes, the name the
//! user gave it and the size the upload declared. Payloads are never mutated; the
//! orchestrator only reads them.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ToolError, ToolResult};

/// Raw bytes of one uploaded image plus its declared name and size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    name: String,
    bytes: Arc<[u8]>,
    declared_size: u64,
}

impl ImagePayload {
    /// Payload whose declared size is its byte length.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let declared_size = bytes.len() as u64;
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_size,
        }
    }

    /// Payload with an explicit declared size, as reported by an upload form.
    pub fn with_declared_size(
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        declared_size: u64,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_size,
        }
    }

    /// Buffer a file from disk. The declared size is the file's metadata length and
    /// the name is its final path component.
    pub fn from_path(path: &Path) -> ToolResult<Self> {
        Self::from_path_within(path, u64::MAX)
    }

    /// Like [`from_path`](Self::from_path), but a file larger than `limit` is not read.
    ///
    /// The payload then has no bytes and keeps the real declared size, so the batch
    /// size gate still reports it as too large instead of the upload failing to load.
    pub fn from_path_within(path: &Path, limit: u64) -> ToolResult<Self> {
        let io_error = |source| ToolError::Io {
            path: path.display().to_string(),
            source,
        };
        let declared_size = fs::metadata(path).map_err(io_error)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if declared_size > limit {
            return Ok(Self::with_declared_size(name, Vec::new(), declared_size));
        }
        let bytes = fs::read(path).map_err(io_error)?;
        Ok(Self::with_declared_size(name, bytes, declared_size))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Size gate: accepted when the declared size is at most `limit`.
    pub fn check_size(&self, limit: u64) -> ToolResult<()> {
        if self.declared_size > limit {
            return Err(ToolError::SizeLimitExceeded {
                name: self.name.clone(),
                size: self.declared_size,
                limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_size_defaults_to_length() {
        let payload = ImagePayload::new("a.png", vec![1u8, 2, 3]);
        assert_eq!(payload.declared_size(), 3);
        assert_eq!(payload.bytes(), &[1, 2, 3]);
        assert_eq!(payload.name(), "a.png");
    }

    #[test]
    fn size_gate_boundary() {
        let at_limit = ImagePayload::with_declared_size("a.png", vec![0u8; 4], 100);
        assert!(at_limit.check_size(100).is_ok());

        let over = ImagePayload::with_declared_size("b.png", vec![0u8; 4], 101);
        match over.check_size(100) {
            Err(ToolError::SizeLimitExceeded { name, size, limit }) => {
                assert_eq!(name, "b.png");
                assert_eq!(size, 101);
                assert_eq!(limit, 100);
            }
            other => panic!("expected SizeLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn oversized_file_is_not_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.png");
        fs::write(&path, vec![7u8; 64]).unwrap();

        let gated = ImagePayload::from_path_within(&path, 63).unwrap();
        assert_eq!(gated.name(), "poster.png");
        assert_eq!(gated.declared_size(), 64);
        assert!(gated.bytes().is_empty());
        assert!(gated.check_size(63).is_err());

        let at_limit = ImagePayload::from_path_within(&path, 64).unwrap();
        assert_eq!(at_limit.bytes().len(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ImagePayload::from_path(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
        assert!(err.to_string().contains("here.png"));
    }
}
