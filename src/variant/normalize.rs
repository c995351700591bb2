//! Resolve a [`VariantRequest`] against an original into a [`ResolvedVariant`].
//!
//! Resolution order:
//!
//! 1. Normalize the crop onto the original. The crop (or the whole original)
//!    becomes the *region* every later step measures against.
//! 2. A request with no size, no bounds, no crop and no aspect ratio is the
//!    unmodified original (possibly re-encoded).
//! 3. Fill an unspecified side from the explicit aspect ratio if there is one,
//!    otherwise from the region.
//! 4. With `keep_aspect`, reshape to the crop's ratio, else the explicit
//!    ratio, else the original's.
//! 5. Without `stretch`, shrink to fit the region.
//! 6. Shrink to fit `max_width` × `max_height`, a missing bound filled from
//!    the explicit ratio or the original.
//! 7. Scalable sources get a rasterisation density from how much larger the
//!    output is than the region; raster sources never do.

use super::{Density, ImageAttributes, ResolvedVariant, VariantRequest};
use crate::geometry::{Crop, Dimensions, GeometryError};
use serde::{Deserialize, Serialize};

/// How scalable sources are rasterised.
///
/// A multiplier `m` maps to `base * m` DPI, snapped up to the next multiple
/// of `step` and capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityPolicy {
    pub base: u32,
    pub step: u32,
    pub max: u32,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self {
            base: 72,
            step: 300,
            max: 1200,
        }
    }
}

impl DensityPolicy {
    pub fn dpi_for(&self, multiplier: u32) -> u32 {
        let raw = self.base.saturating_mul(multiplier.max(1)).min(self.max);
        if self.step == 0 || raw % self.step == 0 {
            return raw;
        }
        (raw / self.step + 1).saturating_mul(self.step).min(self.max)
    }

    /// DPI pair for a multiplier pair; [`Density::NONE`] when neither axis
    /// is enlarged.
    pub fn density_for(&self, multiplier: Density) -> Density {
        if multiplier.is_none() {
            return Density::NONE;
        }
        Density::new(
            self.dpi_for(multiplier.horizontal),
            self.dpi_for(multiplier.vertical),
        )
    }
}

/// Per-axis `ceil(output / region)`, at least 1.
pub fn density_multiplier(output: Dimensions, region: Dimensions) -> Density {
    let axis = |out: u32, src: u32| {
        if src == 0 {
            1
        } else {
            out.div_ceil(src).max(1)
        }
    };
    Density::new(
        axis(output.width, region.width),
        axis(output.height, region.height),
    )
}

#[derive(Debug, Clone, Default)]
pub struct VariantNormalizer {
    density: DensityPolicy,
}

impl VariantNormalizer {
    pub fn new(density: DensityPolicy) -> Self {
        Self { density }
    }

    pub fn density_policy(&self) -> &DensityPolicy {
        &self.density
    }

    pub fn normalize(
        &self,
        request: &VariantRequest,
        original: &ImageAttributes,
    ) -> Result<ResolvedVariant, GeometryError> {
        let canvas = original.dimensions;
        if !canvas.is_complete() {
            return Err(GeometryError::InvalidRequest(format!(
                "original dimensions {canvas} must be positive"
            )));
        }
        let format = request.output_format.unwrap_or(original.format);

        let crop = match request.crop {
            Some(crop) => crop.normalize(canvas)?,
            None => None,
        };
        if let Some(crop) = crop
            && crop.is_empty()
        {
            return Err(GeometryError::InvalidRequest(format!(
                "crop {} lies outside the {canvas} original",
                request.crop.map(|c| c.to_string()).unwrap_or_default()
            )));
        }

        let requested = request.requested_dimensions();
        let bounds = request.max_dimensions();
        if requested.is_empty()
            && bounds.is_empty()
            && crop.is_none()
            && request.aspect_ratio.is_none()
        {
            return Ok(ResolvedVariant::unmodified(canvas, format));
        }

        let region = crop.map(|c| c.dimensions()).unwrap_or(canvas);
        let mut output = match request.aspect_ratio {
            // Largest part of the region with that ratio, whatever `stretch` says.
            Some(ratio) if requested.is_empty() => {
                region.normalize_to_ratio(ratio)?.scale_to_fit_in(region)?
            }
            Some(ratio) => requested.fill_with_ratio(ratio)?,
            None => requested.normalize(region)?,
        };

        if request.keep_aspect {
            let ratio = match (crop, request.aspect_ratio) {
                (Some(crop), _) => crop.dimensions().aspect_ratio()?,
                (None, Some(ratio)) => ratio,
                (None, None) => canvas.aspect_ratio()?,
            };
            output = output.normalize_to_ratio(ratio)?;
        }

        if !request.stretch {
            output = output.scale_to_fit_in(region)?;
        }
        if !bounds.is_empty() {
            let limit = match request.aspect_ratio {
                Some(ratio) => bounds.fill_with_ratio(ratio)?,
                None => bounds.normalize(canvas)?,
            };
            if !output.fits_in(limit) {
                output = output.scale_to_fit_in(limit)?;
            }
        }
        if !output.is_complete() {
            return Err(GeometryError::InvalidRequest(format!(
                "variant resolves to a degenerate size {output}"
            )));
        }

        let density = if original.format.is_scalable() {
            let multiplier = match request.density {
                Some(explicit) => explicit,
                None => density_multiplier(output, region),
            };
            self.density.density_for(multiplier)
        } else {
            Density::NONE
        };

        Ok(ResolvedVariant {
            output,
            crop: crop.unwrap_or_else(|| Crop::whole(canvas)),
            density,
            format,
        })
    }
}
