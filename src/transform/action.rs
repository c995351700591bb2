//! Units of work handed to transformer backends.
//!
//! | Action | Input | Output |
//! |---|---|---|
//! | [`TransformAction::ComputeDimensions`] | bytes of a known format | [`Dimensions`] |
//! | [`TransformAction::ComputeAttributes`] | bytes of unknown format | [`ImageAttributes`] |
//! | [`TransformAction::Modify`] | original + [`ResolvedVariant`] | encoded variant bytes |
//!
//! Backends return a [`TransformOutput`] by value. The dispatcher accepts the
//! first non-empty output whose kind matches the action and never replaces
//! it, so an action's result is decided exactly once.

use crate::geometry::Dimensions;
use crate::variant::{ImageAttributes, ImageFormat, ResolvedVariant};
use std::fmt;
use std::sync::Arc;

/// Encoded image data, shared between every caller that receives it.
pub type ImageBytes = Arc<[u8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ComputeDimensions,
    ComputeAttributes,
    Modify,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ComputeDimensions => "compute-dimensions",
            Self::ComputeAttributes => "compute-attributes",
            Self::Modify => "modify",
        })
    }
}

/// Original image bytes together with their known format.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub format: ImageFormat,
    pub bytes: ImageBytes,
}

impl SourceImage {
    pub fn new(format: ImageFormat, bytes: impl Into<ImageBytes>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransformAction {
    ComputeDimensions {
        source: SourceImage,
    },
    ComputeAttributes {
        bytes: ImageBytes,
    },
    Modify {
        source: SourceImage,
        variant: ResolvedVariant,
    },
}

impl TransformAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::ComputeDimensions { .. } => ActionKind::ComputeDimensions,
            Self::ComputeAttributes { .. } => ActionKind::ComputeAttributes,
            Self::Modify { .. } => ActionKind::Modify,
        }
    }

    /// Format of the input, when the action carries one.
    pub fn source_format(&self) -> Option<ImageFormat> {
        match self {
            Self::ComputeDimensions { source } | Self::Modify { source, .. } => Some(source.format),
            Self::ComputeAttributes { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    Dimensions(Dimensions),
    Attributes(ImageAttributes),
    Image(ImageBytes),
}

impl TransformOutput {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Dimensions(_) => ActionKind::ComputeDimensions,
            Self::Attributes(_) => ActionKind::ComputeAttributes,
            Self::Image(_) => ActionKind::Modify,
        }
    }

    /// No usable result: zero-sized dimensions or zero bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Dimensions(d) => !d.is_complete(),
            Self::Attributes(a) => !a.dimensions.is_complete(),
            Self::Image(bytes) => bytes.is_empty(),
        }
    }
}
