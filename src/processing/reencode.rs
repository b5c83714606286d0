//! # Local Re-encoder
//!
//! The only pixel work done locally: decode an upload and write it back out with
//! size-oriented settings.
//!
//! ## Encoding decision
//!
//! | Source | Output |
//! |--------|--------|
//! | PNG with alpha (RGBA / luma-alpha) | PNG, best compression, adaptive filters, lossless |
//! | anything else | JPEG quality 85, alpha discarded |
//!
//! ## Never larger
//!
//! The encoded size is compared with the upload's declared size. If it is not strictly
//! smaller the item is reported as not reduced (`Ok(None)`); the tool never hands back
//! a file larger than what was uploaded.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::core::ImagePayload;
use crate::error::{ToolError, ToolResult};
use crate::processing::naming::derive_name;
use crate::processing::processing::{ItemProcessor, OutputFormat, ProcessedResult};

/// JPEG quality used for every lossy re-encode.
pub const JPEG_QUALITY: u8 = 85;

/// How an upload is written back out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingDecision {
    /// Lossless PNG so transparency survives bit for bit.
    PreservePng,
    /// Flatten to RGB and encode lossy JPEG at [`JPEG_QUALITY`].
    JpegQuality85,
}

impl EncodingDecision {
    pub fn for_source(format: ImageFormat, color: ColorType) -> Self {
        if format == ImageFormat::Png && color.has_alpha() {
            EncodingDecision::PreservePng
        } else {
            EncodingDecision::JpegQuality85
        }
    }

    pub fn output_format(self) -> OutputFormat {
        match self {
            EncodingDecision::PreservePng => OutputFormat::Png,
            EncodingDecision::JpegQuality85 => OutputFormat::Jpeg,
        }
    }
}

/// Re-encode one upload.
///
/// Returns `Ok(None)` when the re-encoded bytes are not strictly smaller than the
/// declared upload size, and [`ToolError::Decode`] when the payload is not an image.
pub fn optimize(payload: &ImagePayload) -> ToolResult<Option<ProcessedResult>> {
    let decode_error = |reason: String| ToolError::Decode {
        name: payload.name().to_string(),
        reason,
    };
    let format = image::guess_format(payload.bytes()).map_err(|e| decode_error(e.to_string()))?;
    let image = image::load_from_memory_with_format(payload.bytes(), format)
        .map_err(|e| decode_error(e.to_string()))?;

    let decision = EncodingDecision::for_source(format, image.color());
    debug!(
        name = payload.name(),
        source = ?format,
        color = ?image.color(),
        ?decision,
        "re-encoding"
    );

    let encoded = encode(&image, decision).map_err(|e| ToolError::Encode {
        name: payload.name().to_string(),
        reason: e.to_string(),
    })?;

    let output_size = encoded.len() as u64;
    if output_size >= payload.declared_size() {
        debug!(
            name = payload.name(),
            original = payload.declared_size(),
            encoded = output_size,
            "re-encode did not shrink the file"
        );
        return Ok(None);
    }

    let format = decision.output_format();
    Ok(Some(ProcessedResult {
        name: derive_name(payload.name(), format.tag()),
        source_name: payload.name().to_string(),
        format,
        bytes: encoded,
        original_size: payload.declared_size(),
        output_size,
    }))
}

fn encode(image: &DynamicImage, decision: EncodingDecision) -> image::ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match decision {
        EncodingDecision::PreservePng => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        EncodingDecision::JpegQuality85 => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)?;
        }
    }
    Ok(buffer)
}

/// The `compress` tool's per-item step.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOptimizer;

impl ItemProcessor for LocalOptimizer {
    fn process(&self, _index: usize, payload: &ImagePayload) -> ToolResult<Option<ProcessedResult>> {
        optimize(payload)
    }
}
