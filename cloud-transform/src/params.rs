// SPDX-License-Identifier: MIT
//! # Transformation Parameters
//!
//! Describes what the remote service should do to an uploaded image and renders it
//! into the service's comma-separated transformation syntax
//! (`b_gen_fill,c_pad,dpr_1.0,h_460,q_100,w_1000`).
//!
//! ## Components
//!
//! - **CropMode**: how the source is fitted into the target box
//! - **Gravity**: which region survives a crop
//! - **TransformParams**: the full request, with constructors for the two tools that
//!   use the service (canvas expansion and smart crop)
//!
//! Components are emitted in alphabetical order of their short keys so the string, and
//! therefore the upload signature, is stable for equal parameters.

use std::fmt;

/// How the source image is fitted into the target width/height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropMode {
    /// Scale to fit inside the box and pad the remaining canvas.
    Pad,
    /// Scale to cover the box and crop the overflow around the gravity anchor.
    Fill,
}

impl CropMode {
    fn as_str(self) -> &'static str {
        match self {
            CropMode::Pad => "pad",
            CropMode::Fill => "fill",
        }
    }
}

/// Region of the source image to keep when cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Gravity {
    /// Content-aware: the service picks the most salient region.
    #[default]
    Auto,
    Center,
    /// Largest detected face.
    Face,
    /// All detected faces.
    Faces,
    North,
    South,
    East,
    West,
}

impl Gravity {
    pub fn as_str(self) -> &'static str {
        match self {
            Gravity::Auto => "auto",
            Gravity::Center => "center",
            Gravity::Face => "face",
            Gravity::Faces => "faces",
            Gravity::North => "north",
            Gravity::South => "south",
            Gravity::East => "east",
            Gravity::West => "west",
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description of one remote transformation.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformParams {
    /// Target width in CSS pixels.
    pub width: u32,
    /// Target height in CSS pixels.
    pub height: u32,
    pub crop: CropMode,
    /// Only meaningful for [`CropMode::Fill`].
    pub gravity: Option<Gravity>,
    /// Fill padded canvas with generated content instead of a flat colour.
    pub generative_fill: bool,
    /// Output quality percentage, 1-100.
    pub quality: u8,
    /// Pixel-density multiplier applied on top of width/height.
    pub dpr: f32,
    /// Keep the alpha channel through the transformation.
    pub preserve_transparency: bool,
}

impl TransformParams {
    /// AI canvas expansion: pad to the target box and fill the new canvas generatively.
    pub fn canvas_expand(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: CropMode::Pad,
            gravity: None,
            generative_fill: true,
            quality: 100,
            dpr: 1.0,
            preserve_transparency: true,
        }
    }

    /// Content-aware crop around `gravity`, rendered at 3x density.
    pub fn smart_crop(width: u32, height: u32, gravity: Gravity, preserve_transparency: bool) -> Self {
        Self {
            width,
            height,
            crop: CropMode::Fill,
            gravity: Some(gravity),
            generative_fill: false,
            quality: 100,
            dpr: 3.0,
            preserve_transparency,
        }
    }

    /// Render in the service's transformation syntax.
    pub fn to_transformation_string(&self) -> String {
        let mut parts = Vec::with_capacity(8);
        if self.generative_fill {
            parts.push("b_gen_fill".to_string());
        }
        parts.push(format!("c_{}", self.crop.as_str()));
        parts.push(format!("dpr_{:.1}", self.dpr));
        if self.preserve_transparency {
            parts.push("fl_preserve_transparency".to_string());
        }
        if let Some(gravity) = self.gravity {
            parts.push(format!("g_{gravity}"));
        }
        parts.push(format!("h_{}", self.height));
        parts.push(format!("q_{}", self.quality));
        parts.push(format!("w_{}", self.width));
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_expand_string() {
        let params = TransformParams::canvas_expand(1000, 460);
        assert_eq!(
            params.to_transformation_string(),
            "b_gen_fill,c_pad,dpr_1.0,fl_preserve_transparency,h_460,q_100,w_1000"
        );
    }

    #[test]
    fn smart_crop_string() {
        let params = TransformParams::smart_crop(800, 600, Gravity::Faces, false);
        assert_eq!(
            params.to_transformation_string(),
            "c_fill,dpr_3.0,g_faces,h_600,q_100,w_800"
        );

        let png = TransformParams::smart_crop(800, 600, Gravity::North, true);
        assert!(png.to_transformation_string().contains("fl_preserve_transparency"));
    }

    #[test]
    fn gravity_names_match_menu() {
        use clap::ValueEnum;
        let names: Vec<_> = Gravity::value_variants().iter().map(|g| g.as_str()).collect();
        assert_eq!(
            names,
            ["auto", "center", "face", "faces", "north", "south", "east", "west"]
        );
        assert_eq!(Gravity::default(), Gravity::Auto);
    }
}
