//! Raw and resolved variant descriptions.

use super::ImageFormat;
use crate::geometry::{AspectRatio, Crop, Dimensions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal and vertical rasterisation density.
///
/// On a [`VariantRequest`] this is a multiplier of the base density; on a
/// [`ResolvedVariant`] it is the DPI handed to the backend. [`Density::NONE`]
/// means "rasterise at the format's native density".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Density {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Density {
    pub const NONE: Self = Self {
        horizontal: 1,
        vertical: 1,
    };

    pub const fn new(horizontal: u32, vertical: u32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn is_none(self) -> bool {
        self.horizontal <= 1 && self.vertical <= 1
    }
}

impl Default for Density {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.horizontal, self.vertical)
    }
}

/// A variant as asked for by a client. Every field is optional; zero sizes
/// are unspecified.
///
/// Deserialises from JSON or TOML:
///
/// ```
/// # use image_variants::VariantRequest;
/// let request: VariantRequest =
///     serde_json::from_str(r#"{"width": 800, "aspect_ratio": "4/3"}"#).unwrap();
/// assert_eq!(request.width, 800);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantRequest {
    pub width: u32,
    pub height: u32,
    /// Upper bound on the output; zero is unbounded on that side.
    pub max_width: u32,
    pub max_height: u32,
    pub crop: Option<Crop>,
    /// Explicit density multiplier, only honoured for scalable sources.
    pub density: Option<Density>,
    pub aspect_ratio: Option<AspectRatio>,
    /// Allow the output to exceed the (cropped) original.
    pub stretch: bool,
    /// Force the output to the crop's or original's proportions.
    pub keep_aspect: bool,
    pub output_format: Option<ImageFormat>,
}

impl VariantRequest {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn bounded(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn stretched(mut self) -> Self {
        self.stretch = true;
        self
    }

    pub fn keeping_aspect(mut self) -> Self {
        self.keep_aspect = true;
        self
    }

    pub fn cropped(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn with_density(mut self, density: Density) -> Self {
        self.density = Some(density);
        self
    }

    pub fn as_format(mut self, format: ImageFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn requested_dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn max_dimensions(&self) -> Dimensions {
        Dimensions::new(self.max_width, self.max_height)
    }
}

/// Fully resolved, canonical variant. Two requests that resolve to equal
/// values produce identical bytes, so this is the identity used for caching
/// and deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedVariant {
    /// Final pixel size. [`Dimensions::EMPTY`] for the unresized original.
    pub output: Dimensions,
    /// Region of the original, always inside it.
    pub crop: Crop,
    pub density: Density,
    pub format: ImageFormat,
}

impl ResolvedVariant {
    /// The original at its own size, possibly in another format.
    pub fn unmodified(original: Dimensions, format: ImageFormat) -> Self {
        Self {
            output: Dimensions::EMPTY,
            crop: Crop::whole(original),
            density: Density::NONE,
            format,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Pixel size the backend must produce.
    pub fn target_dimensions(&self) -> Dimensions {
        if self.is_empty() {
            self.crop.dimensions()
        } else {
            self.output
        }
    }
}

impl fmt::Display for ResolvedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} at {} as {}",
            self.target_dimensions(),
            self.crop,
            self.density,
            self.format
        )
    }
}
