//! # Tool Configuration
//!
//! Settings for one tool run, shared by the CLI and the library entry points.
//!
//! ## Tools
//!
//! | Tool | Path | Size ceiling | Accepted extensions |
//! |------|------|--------------|---------------------|
//! | `compress` | local re-encode | 50 MB | png, jpg, jpeg |
//! | `expand` | remote generative fill | 10 MB | png, jpg, jpeg |
//! | `crop` | remote smart crop | 10 MB | png, jpg, jpeg, webp |
//!
//! ## Dimensions
//!
//! The remote tools take a target box of 100-3000 px per side, defaulting to
//! 1000x460 (a common banner size).
//!
//! ## Examples
//!
//! ```rust
//! use image_batch_tools::config::{ToolConfig, ToolKind};
//!
//! let config = ToolConfig::new(ToolKind::Crop).with_dimensions(1200, 630);
//! assert!(config.validate().is_ok());
//! assert!(config.accepts("banner.WEBP"));
//! assert!(!ToolConfig::new(ToolKind::Compress).accepts("banner.webp"));
//! ```

use std::path::Path;

use cloud_transform::{Gravity, TransformParams};

use crate::error::{ToolError, ToolResult};

/// Size ceiling of the local compression tool.
pub const COMPRESS_LIMIT_BYTES: u64 = 50 * 1024 * 1024;

/// Size ceiling of the tools that upload to the remote service.
pub const REMOTE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

pub const MIN_DIMENSION: u32 = 100;
pub const MAX_DIMENSION: u32 = 3000;

pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 460;

/// Closed set of upload extensions any tool understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageExtension {
    Png,
    Jpg,
    Jpeg,
    Webp,
}

impl ImageExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Png => "png",
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Webp => "webp",
        }
    }

    /// Classify a filename by its last extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageExtension::Png),
            "jpg" => Some(ImageExtension::Jpg),
            "jpeg" => Some(ImageExtension::Jpeg),
            "webp" => Some(ImageExtension::Webp),
            _ => None,
        }
    }

    /// PNG is the only upload format that can carry transparency through the tools.
    pub fn is_png(self) -> bool {
        self == ImageExtension::Png
    }
}

/// Which tool a batch runs through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    /// Local lossy/lossless re-compression.
    Compress,
    /// AI canvas expansion on the remote service.
    Expand,
    /// Content-aware cropping on the remote service.
    Crop,
}

impl ToolKind {
    pub fn is_remote(self) -> bool {
        !matches!(self, ToolKind::Compress)
    }

    pub fn default_size_limit(self) -> u64 {
        match self {
            ToolKind::Compress => COMPRESS_LIMIT_BYTES,
            ToolKind::Expand | ToolKind::Crop => REMOTE_LIMIT_BYTES,
        }
    }

    pub fn accepted_extensions(self) -> &'static [ImageExtension] {
        use ImageExtension::*;
        match self {
            ToolKind::Compress | ToolKind::Expand => &[Png, Jpg, Jpeg],
            ToolKind::Crop => &[Png, Jpg, Jpeg, Webp],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Compress => "compress",
            ToolKind::Expand => "expand",
            ToolKind::Crop => "crop",
        }
    }
}

/// Settings for one tool run.
#[derive(Clone, Debug)]
pub struct ToolConfig {
    pub kind: ToolKind,

    /// Uploads whose declared size is above this are skipped before processing.
    /// A size exactly equal to the ceiling is accepted.
    pub max_upload_bytes: u64,

    /// Target width for the remote tools, in px.
    pub width: u32,

    /// Target height for the remote tools, in px.
    pub height: u32,

    /// Crop anchor. Ignored by `compress` and `expand`.
    pub gravity: Gravity,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::new(ToolKind::Compress)
    }
}

impl ToolConfig {
    /// Defaults for `kind`: its size ceiling, 1000x460, automatic gravity.
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            max_upload_bytes: kind.default_size_limit(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            gravity: Gravity::Auto,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Validates the configuration parameters.
    ///
    /// Dimensions are only checked for the remote tools; `compress` ignores them.
    pub fn validate(&self) -> ToolResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ToolError::InvalidConfig {
                field: "size limit",
                value: "0".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.kind.is_remote() {
            for (field, value) in [("width", self.width), ("height", self.height)] {
                if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                    return Err(ToolError::InvalidConfig {
                        field,
                        value: value.to_string(),
                        reason: format!("must be between {MIN_DIMENSION} and {MAX_DIMENSION} px"),
                    });
                }
            }
        }
        Ok(())
    }

    /// True if `name` has one of the tool's accepted extensions.
    pub fn accepts(&self, name: &str) -> bool {
        ImageExtension::from_name(name)
            .is_some_and(|ext| self.kind.accepted_extensions().contains(&ext))
    }

    /// Reject uploads whose extension the tool does not accept.
    pub fn check_extension(&self, name: &str) -> ToolResult<()> {
        if self.accepts(name) {
            return Ok(());
        }
        let accepted = self
            .kind
            .accepted_extensions()
            .iter()
            .map(|ext| ext.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ToolError::UnsupportedExtension {
            name: name.to_string(),
            accepted,
        })
    }

    /// Remote transformation for one upload, `None` for the local tool.
    ///
    /// The crop tool only asks the service to keep transparency for `.png` uploads;
    /// expansion always keeps it.
    pub fn to_transform_params(&self, source_name: &str) -> Option<TransformParams> {
        match self.kind {
            ToolKind::Compress => None,
            ToolKind::Expand => Some(TransformParams::canvas_expand(self.width, self.height)),
            ToolKind::Crop => {
                let is_png = ImageExtension::from_name(source_name).is_some_and(ImageExtension::is_png);
                Some(TransformParams::smart_crop(
                    self.width,
                    self.height,
                    self.gravity,
                    is_png,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert_eq!(config.kind, ToolKind::Compress);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.width, 1000);
        assert_eq!(config.height, 460);
        assert_eq!(config.gravity, Gravity::Auto);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ToolConfig::new(ToolKind::Expand);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());

        config.width = 99;
        assert!(config.validate().is_err());
        config.width = 3000;
        assert!(config.validate().is_ok());

        config.height = 3001;
        let err = config.validate().unwrap_err();
        assert!(err.is_batch_fatal());
        assert!(err.to_string().contains("height"));
        config.height = 100;
        assert!(config.validate().is_ok());

        // Compress ignores dimensions
        let compress = ToolConfig::new(ToolKind::Compress).with_dimensions(1, 1);
        assert!(compress.validate().is_ok());
        assert!(compress.with_size_limit(0).validate().is_err());
    }

    #[test]
    fn extension_classification() {
        assert_eq!(ImageExtension::from_name("photo.PNG"), Some(ImageExtension::Png));
        assert_eq!(ImageExtension::from_name("dir/a.b.JPEG"), Some(ImageExtension::Jpeg));
        assert_eq!(ImageExtension::from_name("clip.gif"), None);
        assert_eq!(ImageExtension::from_name("noext"), None);

        let crop = ToolConfig::new(ToolKind::Crop);
        assert!(crop.check_extension("x.webp").is_ok());
        let err = ToolConfig::new(ToolKind::Expand)
            .check_extension("x.webp")
            .unwrap_err();
        assert!(err.to_string().contains("png, jpg, jpeg"));
    }

    #[test]
    fn transform_params_per_tool() {
        assert!(ToolConfig::new(ToolKind::Compress)
            .to_transform_params("a.png")
            .is_none());

        let expand = ToolConfig::new(ToolKind::Expand)
            .to_transform_params("a.jpg")
            .unwrap();
        assert!(expand.preserve_transparency);
        assert!(expand.generative_fill);

        let crop = ToolConfig::new(ToolKind::Crop).with_gravity(Gravity::Faces);
        let png = crop.to_transform_params("Logo.PNG").unwrap();
        assert!(png.preserve_transparency);
        assert_eq!(png.gravity, Some(Gravity::Faces));
        assert_eq!(png.dpr, 3.0);
        let jpg = crop.to_transform_params("photo.jpg").unwrap();
        assert!(!jpg.preserve_transparency);
    }
}
