//! In-process raster backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify format | `ImageReader::with_guessed_format` (magic bytes) |
//! | Dimensions | `ImageReader::into_dimensions` (header only, no full decode) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Alpha flattening | composite onto white, for outputs without transparency |
//! | Encode | `JpegEncoder` with configured quality; `write_to` for the lossless formats |
//!
//! Scalable formats (SVG, EPS, PDF) are never claimed: they need a
//! rasterising backend registered alongside this one.

use super::params::{ModifyParams, Quality};
use super::{
    Capability, SourceImage, TransformAction, TransformError, TransformOutput, TransformerBackend,
};
use crate::config::RasterConfig;
use crate::geometry::Dimensions;
use crate::variant::{ImageAttributes, ImageFormat, ResolvedVariant};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage, Rgba};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct RasterTransformer {
    priority: i32,
    enabled: AtomicBool,
    quality: Quality,
}

impl RasterTransformer {
    pub const NAME: &'static str = "raster";

    pub fn new() -> Self {
        Self::from_config(&RasterConfig::default())
    }

    pub fn from_config(config: &RasterConfig) -> Self {
        Self {
            priority: config.priority,
            enabled: AtomicBool::new(config.enabled),
            quality: Quality::new(config.quality),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn modify(&self, source: &SourceImage, variant: &ResolvedVariant) -> Result<Vec<u8>, TransformError> {
        let params = ModifyParams::for_variant(variant, self.quality)?;
        let img = decode(source)?;
        let cropped = img.crop_imm(
            params.crop_x,
            params.crop_y,
            params.crop_width,
            params.crop_height,
        );
        let resized = if params.is_crop_only() {
            cropped
        } else {
            cropped.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        let prepared = if params.flatten_alpha {
            flatten_onto_white(&resized)
        } else {
            DynamicImage::ImageRgba8(resized.to_rgba8())
        };
        encode(&prepared, &params)
    }
}

impl Default for RasterTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn codec(format: ImageFormat) -> Option<image::ImageFormat> {
    match format {
        ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
        ImageFormat::Png => Some(image::ImageFormat::Png),
        ImageFormat::Gif => Some(image::ImageFormat::Gif),
        ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
        ImageFormat::Webp => Some(image::ImageFormat::WebP),
        ImageFormat::Svg | ImageFormat::Eps | ImageFormat::Pdf => None,
    }
}

fn from_codec(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        _ => None,
    }
}

fn require_codec(format: ImageFormat) -> Result<image::ImageFormat, TransformError> {
    codec(format)
        .ok_or_else(|| TransformError::Unsupported(format!("{format} is not a raster format")))
}

fn reader(source: &SourceImage) -> Result<ImageReader<Cursor<&[u8]>>, TransformError> {
    Ok(ImageReader::with_format(
        Cursor::new(&source.bytes[..]),
        require_codec(source.format)?,
    ))
}

fn decode(source: &SourceImage) -> Result<DynamicImage, TransformError> {
    reader(source)?
        .decode()
        .map_err(|e| TransformError::Decode(format!("{} image: {e}", source.format)))
}

fn identify(bytes: &[u8]) -> Result<ImageAttributes, TransformError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .and_then(from_codec)
        .ok_or_else(|| TransformError::Unsupported("unrecognised image data".into()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    Ok(ImageAttributes::new(format, Dimensions::new(width, height)))
}

fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let rgba = img.to_rgba8();
    let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flat)
}

fn encode(img: &DynamicImage, params: &ModifyParams) -> Result<Vec<u8>, TransformError> {
    let target = require_codec(params.format)?;
    let mut buffer = Cursor::new(Vec::new());
    let written = match target {
        image::ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, params.quality.value() as u8);
            img.write_with_encoder(encoder)
        }
        other => img.write_to(&mut buffer, other),
    };
    written.map_err(|e| TransformError::Encode(format!("{} output: {e}", params.format)))?;
    Ok(buffer.into_inner())
}

impl TransformerBackend for RasterTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn can_execute(&self, action: &TransformAction) -> Capability {
        let supported = match action {
            TransformAction::ComputeAttributes { .. } => return Capability::Fallback,
            TransformAction::ComputeDimensions { source } => codec(source.format).is_some(),
            TransformAction::Modify { source, variant } => {
                codec(source.format).is_some() && codec(variant.format).is_some()
            }
        };
        if supported {
            Capability::Preferred
        } else {
            Capability::Unable
        }
    }

    fn execute(&self, action: &TransformAction) -> Result<TransformOutput, TransformError> {
        match action {
            TransformAction::ComputeDimensions { source } => {
                let (width, height) = reader(source)?
                    .into_dimensions()
                    .map_err(|e| TransformError::Decode(e.to_string()))?;
                Ok(TransformOutput::Dimensions(Dimensions::new(width, height)))
            }
            TransformAction::ComputeAttributes { bytes } => {
                identify(bytes).map(TransformOutput::Attributes)
            }
            TransformAction::Modify { source, variant } => self
                .modify(source, variant)
                .map(|bytes| TransformOutput::Image(bytes.into())),
        }
    }
}
