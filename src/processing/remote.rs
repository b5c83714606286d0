//! # Remote Transform Path
//!
//! Adapts the remote service client to the batch pipeline for the `expand` and `crop`
//! tools.
//!
//! ## Session lifecycle
//!
//! 1. [`initialize`] turns a credentials URL into a client handle. No network I/O.
//!    Missing or malformed credentials are a [`ToolError::Configuration`], which
//!    aborts the batch before it starts.
//! 2. [`sweep_stale_resources`] deletes whatever earlier sessions left on the
//!    service. Best effort.
//! 3. [`RemoteProcessor`] handles each item: upload + transform, fetch, then delete
//!    the resource it just created, whether or not the fetch worked.

use cloud_transform::{CloudinaryClient, Credentials, RemoteTransform};
use tracing::{debug, info, warn};

use crate::config::{ToolConfig, ToolKind};
use crate::core::ImagePayload;
use crate::error::{ToolError, ToolResult};
use crate::processing::naming::{cropped_name, expanded_name};
use crate::processing::processing::{ItemProcessor, OutputFormat, ProcessedResult};

/// Build the remote client handle from a `cloudinary://` URL.
///
/// `None` (no URL configured) and unparsable URLs are both configuration errors.
pub fn initialize(cloudinary_url: Option<&str>) -> ToolResult<CloudinaryClient> {
    let url = cloudinary_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ToolError::Configuration {
            reason: "no CLOUDINARY_URL was provided".into(),
        })?;
    let credentials = Credentials::from_url(url).map_err(|e| ToolError::Configuration {
        reason: e.to_string(),
    })?;
    let client = CloudinaryClient::new(credentials).map_err(|e| ToolError::Configuration {
        reason: e.to_string(),
    })?;
    info!(cloud = client.cloud_name(), "remote client ready");
    Ok(client)
}

/// Delete every resource currently stored on the service.
///
/// Returns how many ids were deleted. Failures are logged and reported as zero.
pub fn sweep_stale_resources(client: &dyn RemoteTransform) -> usize {
    let swept = client.list_resources().and_then(|ids| {
        client.delete_resources(&ids)?;
        Ok(ids.len())
    });
    match swept {
        Ok(count) => {
            if count > 0 {
                info!(count, "swept stale remote resources");
            }
            count
        }
        Err(source) => {
            let error = ToolError::Cleanup { source };
            warn!(%error, "startup sweep failed");
            0
        }
    }
}

/// Per-item step of the `expand` and `crop` tools.
pub struct RemoteProcessor<'a> {
    client: &'a dyn RemoteTransform,
    config: ToolConfig,
}

impl<'a> RemoteProcessor<'a> {
    /// Fails with [`ToolError::InvalidConfig`] for the local tool or out-of-range
    /// dimensions, before any item is touched.
    pub fn new(client: &'a dyn RemoteTransform, config: ToolConfig) -> ToolResult<Self> {
        if !config.kind.is_remote() {
            return Err(ToolError::InvalidConfig {
                field: "tool",
                value: config.kind.as_str().into(),
                reason: "does not use the remote service".into(),
            });
        }
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn output_name(&self, index: usize, source_name: &str, format: &str) -> String {
        match self.config.kind {
            ToolKind::Crop => cropped_name(source_name),
            _ => expanded_name(index, format),
        }
    }

    fn cleanup(&self, public_id: String) {
        if let Err(source) = self.client.delete_resources(&[public_id]) {
            let error = ToolError::Cleanup { source };
            warn!(%error, "could not delete remote resource");
        }
    }
}

impl ItemProcessor for RemoteProcessor<'_> {
    fn process(&self, index: usize, payload: &ImagePayload) -> ToolResult<Option<ProcessedResult>> {
        let remote_error = |source| ToolError::RemoteCall {
            name: payload.name().to_string(),
            source,
        };
        let params = self
            .config
            .to_transform_params(payload.name())
            .ok_or_else(|| ToolError::InvalidConfig {
                field: "tool",
                value: self.config.kind.as_str().into(),
                reason: "does not use the remote service".into(),
            })?;

        let asset = self
            .client
            .transform(payload.bytes(), &params)
            .map_err(remote_error)?;
        debug!(name = payload.name(), public_id = %asset.public_id, "remote transform done");

        let fetched = self.client.fetch(&asset.url);
        self.cleanup(asset.public_id);
        let bytes = fetched.map_err(remote_error)?;

        let output_size = bytes.len() as u64;
        Ok(Some(ProcessedResult {
            name: self.output_name(index, payload.name(), &asset.format),
            source_name: payload.name().to_string(),
            format: OutputFormat::from_tag(&asset.format),
            bytes,
            original_size: payload.declared_size(),
            output_size,
        }))
    }
}
