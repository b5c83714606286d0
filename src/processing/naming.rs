//! # Output Filenames
//!
//! Pure, deterministic naming of results so archive contents are reproducible.
//!
//! - compress: `<stem>_optimizado.<format>` (`photo.PNG` → `photo_optimizado.png`)
//! - expand: `imagen_procesada_<index>.<format>`
//! - crop: `procesada_<original name>`

use std::path::Path;

/// Marker appended to the stem of locally optimized files.
pub const OPTIMIZED_MARKER: &str = "_optimizado";

/// Extension used when the output format is empty or unknown.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Formats that may appear as an output extension.
const KNOWN_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "avif", "bmp", "tiff"];

/// Stem used when the upload name has none.
const FALLBACK_STEM: &str = "imagen";

/// `<stem>_optimizado.<ext>`: directory components and the last extension of
/// `original_name` are dropped; `ext` is the lower-cased `output_format`, or `jpg` if
/// that is empty or unknown.
pub fn derive_name(original_name: &str, output_format: &str) -> String {
    format!(
        "{}{OPTIMIZED_MARKER}.{}",
        stem(original_name),
        extension_for(output_format)
    )
}

/// Name of the `index`-th (zero-based) expanded image.
pub fn expanded_name(index: usize, output_format: &str) -> String {
    format!("imagen_procesada_{index}.{}", extension_for(output_format))
}

/// Name of a cropped image: the original file name, prefixed.
pub fn cropped_name(original_name: &str) -> String {
    let file_name = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_STEM);
    format!("procesada_{file_name}")
}

fn stem(original_name: &str) -> &str {
    Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM)
}

fn extension_for(output_format: &str) -> String {
    let format = output_format.trim().to_ascii_lowercase();
    if KNOWN_FORMATS.contains(&format.as_str()) {
        format
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}
