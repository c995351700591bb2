//! Pixel-level parameters for a modify action.
//!
//! These structs describe *what* to do, not *how*. [`ModifyParams`] flattens
//! a [`ResolvedVariant`] into plain unsigned pixel coordinates so a backend
//! never has to reason about crop sources, empty outputs or signed edges.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ModifyParams`]: crop rectangle, exact output size, output format, quality.

use super::TransformError;
use crate::variant::{ImageFormat, ResolvedVariant};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifyParams {
    pub crop_x: u32,
    pub crop_y: u32,
    pub crop_width: u32,
    pub crop_height: u32,
    /// Exact output size.
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub quality: Quality,
    /// Composite onto white before encoding; set when the output format
    /// cannot carry alpha.
    pub flatten_alpha: bool,
}

impl ModifyParams {
    pub fn for_variant(variant: &ResolvedVariant, quality: Quality) -> Result<Self, TransformError> {
        let coord = |v: i64, what: &str| {
            u32::try_from(v).map_err(|_| {
                TransformError::Unsupported(format!("crop {what} {v} is outside the pixel range"))
            })
        };
        let target = variant.target_dimensions();
        Ok(Self {
            crop_x: coord(variant.crop.x, "x")?,
            crop_y: coord(variant.crop.y, "y")?,
            crop_width: coord(variant.crop.width, "width")?,
            crop_height: coord(variant.crop.height, "height")?,
            width: target.width,
            height: target.height,
            format: variant.format,
            quality,
            flatten_alpha: !variant.format.has_transparency(),
        })
    }

    /// Output size equals the crop, so no resampling is needed.
    pub fn is_crop_only(&self) -> bool {
        self.width == self.crop_width && self.height == self.crop_height
    }
}
