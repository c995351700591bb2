//! Image formats known to the engine.

use crate::geometry::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Webp,
    Svg,
    Eps,
    Pdf,
}

impl ImageFormat {
    pub const ALL: [Self; 8] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Tiff,
        Self::Webp,
        Self::Svg,
        Self::Eps,
        Self::Pdf,
    ];

    /// Vector or page formats that are rasterised at a chosen density.
    pub fn is_scalable(self) -> bool {
        matches!(self, Self::Svg | Self::Eps | Self::Pdf)
    }

    pub fn has_transparency(self) -> bool {
        matches!(
            self,
            Self::Png | Self::Gif | Self::Tiff | Self::Webp | Self::Svg
        )
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Tiff => "tif",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Eps => "application/postscript",
            Self::Pdf => "application/pdf",
        }
    }

    /// Case-insensitive, accepts the common aliases (`jpeg`, `tiff`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            "svg" => Some(Self::Svg),
            "eps" => Some(Self::Eps),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What the engine knows about a stored original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageAttributes {
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

impl ImageAttributes {
    pub fn new(format: ImageFormat, dimensions: Dimensions) -> Self {
        Self { format, dimensions }
    }
}
