//! Width × height pairs and the fitting rules between them.
//!
//! A zero side means "unspecified": [`Dimensions::normalize`] fills it from
//! the proportions of a reference box. Fitting never enlarges beyond the box
//! and always keeps the proportions of the dimensions being fitted:
//!
//! ```text
//! 3200×1000 in 1600×1200  →  1600×500    (width-bound)
//! 1400×2400 in 1600×1200  →   700×1200   (height-bound)
//!    0×2400 in 1600×1200  →  1600×1200   (filled from the box, then fitted)
//! ```

use super::{AspectRatio, GeometryError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const EMPTY: Self = Self {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both sides unspecified.
    pub fn is_empty(self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Exactly one side unspecified.
    pub fn is_partial(self) -> bool {
        (self.width == 0) != (self.height == 0)
    }

    /// Both sides set.
    pub fn is_complete(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(self) -> Result<AspectRatio, GeometryError> {
        AspectRatio::from_sides(self.width, self.height)
    }

    pub fn fits_in(self, boundaries: Self) -> bool {
        self.width <= boundaries.width && self.height <= boundaries.height
    }

    /// Fill unspecified sides from `boundaries`.
    ///
    /// Both sides zero yields `boundaries` itself; one side zero is derived
    /// from the proportions of `boundaries`; complete dimensions are returned
    /// unchanged.
    pub fn normalize(self, boundaries: Self) -> Result<Self, GeometryError> {
        if self.is_empty() {
            return Ok(boundaries);
        }
        if self.is_complete() {
            return Ok(self);
        }
        self.fill_with_ratio(boundaries.aspect_ratio()?)
    }

    /// Derive a single unspecified side from `ratio`.
    pub fn fill_with_ratio(self, ratio: AspectRatio) -> Result<Self, GeometryError> {
        if self.height == 0 && self.width > 0 {
            Ok(Self::new(self.width, ratio.calculate_height_for_width(self.width)?))
        } else if self.width == 0 && self.height > 0 {
            Ok(Self::new(ratio.calculate_width_for_height(self.height)?, self.height))
        } else {
            Ok(self)
        }
    }

    /// Reshape to `ratio`, anchoring on the side the ratio favours.
    ///
    /// A landscape ratio keeps the width and recomputes the height; a portrait
    /// or square ratio keeps the height and recomputes the width.
    pub fn normalize_to_ratio(self, ratio: AspectRatio) -> Result<Self, GeometryError> {
        if self.aspect_ratio()? == ratio {
            return Ok(self);
        }
        if ratio.is_larger_on_width() {
            Ok(Self::new(self.width, ratio.calculate_height_for_width(self.width)?))
        } else {
            Ok(Self::new(ratio.calculate_width_for_height(self.height)?, self.height))
        }
    }

    /// Shrink to fit inside `boundaries` keeping proportions.
    ///
    /// Unspecified sides are filled from `boundaries` first. Dimensions that
    /// already fit are returned unchanged; this never upscales.
    pub fn scale_to_fit_in(self, boundaries: Self) -> Result<Self, GeometryError> {
        let normalized = self.normalize(boundaries)?;
        if normalized.fits_in(boundaries) {
            return Ok(normalized);
        }
        let ratio = normalized.aspect_ratio()?;
        let by_width = || -> Result<Self, GeometryError> {
            Ok(Self::new(
                boundaries.width,
                ratio.calculate_height_for_width(boundaries.width)?,
            ))
        };
        let by_height = || -> Result<Self, GeometryError> {
            Ok(Self::new(
                ratio.calculate_width_for_height(boundaries.height)?,
                boundaries.height,
            ))
        };
        let width_first = ratio.is_larger_on_width();
        let scaled = if width_first { by_width()? } else { by_height()? };
        if scaled.fits_in(boundaries) {
            return Ok(scaled);
        }
        if width_first { by_height() } else { by_width() }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
